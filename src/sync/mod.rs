// SPDX-License-Identifier: MPL-2.0

//! Synchronization primitives shared by every blocking operation in the
//! kernel: a wait queue with a lost-wakeup-free sleep protocol.

mod wait;

pub use wait::{WaitQueue, Waiter, Waker};
