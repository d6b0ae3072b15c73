// SPDX-License-Identifier: MPL-2.0

use super::{ShutdownCmd, StreamSocket};
use crate::{fs::pipe::Pipe, prelude::*};

/// The connected state of a stream socket.
///
/// A connection is two pipes of opposite directions; each side keeps its
/// own view, crosswise: this side's write pipe is the peer's read pipe.
/// Shutting down a direction closes this side's end of the matching pipe
/// and empties the slot, so repeated shutdowns are no-ops.
pub(super) struct Peer {
    peer: Weak<StreamSocket>,
    read_pipe: Mutex<Option<Arc<Pipe>>>,
    write_pipe: Mutex<Option<Arc<Pipe>>>,
}

impl Peer {
    pub(super) fn new(
        peer: Weak<StreamSocket>,
        read_pipe: Arc<Pipe>,
        write_pipe: Arc<Pipe>,
    ) -> Self {
        Self {
            peer,
            read_pipe: Mutex::new(Some(read_pipe)),
            write_pipe: Mutex::new(Some(write_pipe)),
        }
    }

    pub(super) fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let pipe = self.read_pipe.lock().clone().ok_or(Error::with_message(
            Errno::EPIPE,
            "the read direction is shut down",
        ))?;
        pipe.read(buf)
    }

    pub(super) fn write(&self, buf: &[u8]) -> Result<usize> {
        if self.peer.upgrade().is_none() {
            return_errno_with_message!(Errno::EPIPE, "the peer socket is closed");
        }
        let pipe = self.write_pipe.lock().clone().ok_or(Error::with_message(
            Errno::EPIPE,
            "the write direction is shut down",
        ))?;
        pipe.write(buf)
    }

    pub(super) fn shutdown(&self, cmd: ShutdownCmd) {
        if cmd.shut_read() {
            if let Some(pipe) = self.read_pipe.lock().take() {
                pipe.close_reader();
            }
        }
        if cmd.shut_write() {
            if let Some(pipe) = self.write_pipe.lock().take() {
                pipe.close_writer();
            }
        }
    }

    pub(super) fn close(&self) {
        self.shutdown(ShutdownCmd::Both);
    }
}
