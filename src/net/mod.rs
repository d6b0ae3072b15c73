// SPDX-License-Identifier: MPL-2.0

//! Stream sockets built on top of pipes.

pub mod socket;
