// SPDX-License-Identifier: MPL-2.0

use super::file_handle::FileLike;
use crate::{prelude::*, sync::WaitQueue};

/// Capacity of a pipe's ring buffer in bytes.
pub const PIPE_BUF_SIZE: usize = 4000;

/// Creates a connected pipe and returns its two ends.
pub fn new_pair() -> (Arc<PipeReader>, Arc<PipeWriter>) {
    let pipe = Arc::new(Pipe::new());
    (
        Arc::new(PipeReader { pipe: pipe.clone() }),
        Arc::new(PipeWriter { pipe }),
    )
}

/// A bounded single-direction byte stream.
///
/// The record is shared by the two ends (and, for sockets, by the two
/// peers); it is freed when the last reference is dropped, which can only
/// happen after both ends have been closed.
pub struct Pipe {
    state: Mutex<PipeState>,
    /// Woken when bytes become readable or the writer closes.
    has_data: WaitQueue,
    /// Woken when space becomes writable or the reader closes.
    has_space: WaitQueue,
}

struct PipeState {
    buf: Box<[u8]>,
    /// Total bytes ever written; the ring index is `w_pos % PIPE_BUF_SIZE`.
    w_pos: usize,
    /// Total bytes ever read; `w_pos - r_pos` is the buffered length.
    r_pos: usize,
    reader_open: bool,
    writer_open: bool,
}

impl PipeState {
    fn len(&self) -> usize {
        self.w_pos - self.r_pos
    }

    /// Copies from `src` into the ring until it is full, in at most two
    /// contiguous segments.
    fn write_into(&mut self, src: &[u8]) -> usize {
        let count = src.len().min(PIPE_BUF_SIZE - self.len());
        let start = self.w_pos % PIPE_BUF_SIZE;
        let first = count.min(PIPE_BUF_SIZE - start);
        self.buf[start..start + first].copy_from_slice(&src[..first]);
        self.buf[..count - first].copy_from_slice(&src[first..count]);
        self.w_pos += count;
        debug_assert!(self.len() <= PIPE_BUF_SIZE);
        count
    }

    /// Copies buffered bytes out into `dst`, FIFO.
    fn read_from(&mut self, dst: &mut [u8]) -> usize {
        let count = dst.len().min(self.len());
        let start = self.r_pos % PIPE_BUF_SIZE;
        let first = count.min(PIPE_BUF_SIZE - start);
        dst[..first].copy_from_slice(&self.buf[start..start + first]);
        dst[first..count].copy_from_slice(&self.buf[..count - first]);
        self.r_pos += count;
        count
    }
}

impl Pipe {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(PipeState {
                buf: vec![0u8; PIPE_BUF_SIZE].into_boxed_slice(),
                w_pos: 0,
                r_pos: 0,
                reader_open: true,
                writer_open: true,
            }),
            has_data: WaitQueue::new(),
            has_space: WaitQueue::new(),
        }
    }

    /// Reads up to `buf.len()` bytes.
    ///
    /// Blocks while the pipe is empty and the write end is open. Once the
    /// write end closes, the remaining buffered bytes are delivered and
    /// every further read returns `Ok(0)`.
    pub(crate) fn read(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return_errno_with_message!(Errno::EINVAL, "cannot read zero bytes");
        }

        let read_len = self.has_data.wait_until(|| {
            let mut state = self.state.lock();
            if !state.reader_open {
                return Some(Err(Error::with_message(
                    Errno::EPIPE,
                    "the read end is closed",
                )));
            }
            if state.len() > 0 {
                Some(Ok(state.read_from(buf)))
            } else if !state.writer_open {
                // End of stream.
                Some(Ok(0))
            } else {
                None
            }
        })?;

        if read_len > 0 {
            self.has_space.wake_all();
        }
        Ok(read_len)
    }

    /// Writes all of `buf`, blocking whenever the ring is full.
    ///
    /// Fails with `EPIPE` if the read end closes before the last byte is
    /// buffered; bytes written up to that point are discarded from the
    /// caller's view.
    pub(crate) fn write(&self, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return_errno_with_message!(Errno::EINVAL, "cannot write zero bytes");
        }

        let mut written = 0;
        while written < buf.len() {
            let n = self.has_space.wait_until(|| {
                let mut state = self.state.lock();
                if !state.reader_open {
                    return Some(Err(Error::with_message(
                        Errno::EPIPE,
                        "the read end is closed",
                    )));
                }
                if !state.writer_open {
                    return Some(Err(Error::with_message(
                        Errno::EPIPE,
                        "the write end is closed",
                    )));
                }
                match state.write_into(&buf[written..]) {
                    0 => None,
                    n => Some(Ok(n)),
                }
            })?;

            written += n;
            self.has_data.wake_all();
        }
        Ok(written)
    }

    /// Closes the read end. Blocked writers wake up and observe the
    /// broken pipe. Idempotent.
    pub(crate) fn close_reader(&self) {
        let mut state = self.state.lock();
        if !state.reader_open {
            return;
        }
        state.reader_open = false;
        drop(state);

        self.has_space.wake_all();
        self.has_data.wake_all();
    }

    /// Closes the write end. Blocked readers wake up and observe the end
    /// of the stream. Idempotent.
    pub(crate) fn close_writer(&self) {
        let mut state = self.state.lock();
        if !state.writer_open {
            return;
        }
        state.writer_open = false;
        drop(state);

        self.has_data.wake_all();
        self.has_space.wake_all();
    }
}

/// The readable end of a pipe, as an open stream.
pub struct PipeReader {
    pipe: Arc<Pipe>,
}

impl FileLike for PipeReader {
    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.pipe.read(buf)
    }

    fn close(&self) {
        self.pipe.close_reader();
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        // Backstop for ends that never entered a file table.
        self.pipe.close_reader();
    }
}

/// The writable end of a pipe, as an open stream.
pub struct PipeWriter {
    pipe: Arc<Pipe>,
}

impl FileLike for PipeWriter {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        self.pipe.write(buf)
    }

    fn close(&self) {
        self.pipe.close_writer();
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        self.pipe.close_writer();
    }
}
