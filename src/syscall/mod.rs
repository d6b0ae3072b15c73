// SPDX-License-Identifier: MPL-2.0

//! The system-call surface.
//!
//! Every entry resolves the current process, dereferences fids through
//! the stream layer, and delegates to the owning subsystem. Errors leave
//! as [`crate::error::Error`] values; the sentinel returns of classic
//! kernels map onto the errno they carry.

pub mod pipe;
pub mod process;
pub mod socket;
pub mod stream;
pub mod thread;
