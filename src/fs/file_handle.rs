// SPDX-License-Identifier: MPL-2.0

#![allow(unused_variables)]

//! Opened stream handle

use crate::{net::socket::StreamSocket, prelude::*};

/// The basic operations defined on an open stream.
///
/// The concrete stream types override the operations that apply to them;
/// the defaults are the trap entries for the ones that do not (reading
/// the write end of a pipe, writing a process-info stream, and so on).
pub trait FileLike: Send + Sync {
    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        return_errno_with_message!(Errno::EBADF, "the file is not valid for reading");
    }

    fn write(&self, buf: &[u8]) -> Result<usize> {
        return_errno_with_message!(Errno::EBADF, "the file is not valid for writing");
    }

    /// Runs the stream's close side effects.
    ///
    /// Called by the file table when the last file record referring to
    /// this stream is released — an operation still blocked on the stream
    /// keeps the object alive but does not delay the close, so it can
    /// wake up and observe it. Must be idempotent.
    fn close(&self) {}

    /// Downcasts the handle to a stream socket, for the socket-only
    /// system calls.
    fn as_socket(self: Arc<Self>) -> Option<Arc<StreamSocket>> {
        None
    }
}

impl core::fmt::Debug for dyn FileLike {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("dyn FileLike").finish()
    }
}
