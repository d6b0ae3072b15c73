// SPDX-License-Identifier: MPL-2.0

mod connected;
mod listener;

use connected::Peer;
use listener::{ConnRequest, Listener};

pub(crate) use listener::clear_port_map;

use crate::{
    fs::{file_handle::FileLike, pipe::Pipe},
    prelude::*,
};

/// A port number. Ports `1..=MAX_PORT` can carry a listener.
pub type Port = u32;

/// "Not bound to any port".
pub const NOPORT: Port = 0;

/// The highest usable port number.
pub const MAX_PORT: Port = 1023;

/// One direction of socket communication to shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCmd {
    Read,
    Write,
    Both,
}

impl ShutdownCmd {
    pub fn shut_read(&self) -> bool {
        *self == Self::Read || *self == Self::Both
    }

    pub fn shut_write(&self) -> bool {
        *self == Self::Write || *self == Self::Both
    }
}

/// A stream socket.
///
/// Starts unbound; becomes a listener (`listen`) or one side of a
/// connected pair (`connect`, or being minted by `accept`). Both
/// transitions are final until close.
pub struct StreamSocket {
    port: Port,
    state: RwLock<State>,
}

impl core::fmt::Debug for StreamSocket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StreamSocket").field("port", &self.port).finish()
    }
}

enum State {
    Unbound,
    Listener(Arc<Listener>),
    Peer(Arc<Peer>),
}

impl StreamSocket {
    /// Creates an unbound socket, optionally bound to `port`
    /// (`NOPORT` means unbound-to-port).
    pub(crate) fn new(port: Port) -> Result<Arc<Self>> {
        if port > MAX_PORT {
            return_errno_with_message!(Errno::EINVAL, "the port is out of range");
        }
        Ok(Self::with_port(port))
    }

    fn with_port(port: Port) -> Arc<Self> {
        Arc::new(Self {
            port,
            state: RwLock::new(State::Unbound),
        })
    }

    pub(crate) fn port(&self) -> Port {
        self.port
    }

    /// Turns the socket into the published listener of its port.
    pub(crate) fn listen(&self) -> Result<()> {
        let mut state = self.state.write();
        match &*state {
            State::Unbound => (),
            State::Listener(_) => {
                return_errno_with_message!(Errno::EINVAL, "the socket is already listening")
            }
            State::Peer(_) => {
                return_errno_with_message!(Errno::EISCONN, "the socket is already connected")
            }
        }
        if self.port == NOPORT {
            return_errno_with_message!(Errno::EINVAL, "the socket is not bound to a port");
        }

        let new_listener = Arc::new(Listener::new(self.port));
        listener::publish(&new_listener)?;
        *state = State::Listener(new_listener);
        Ok(())
    }

    /// Waits for a connection request and mints the accepting side of the
    /// pair.
    ///
    /// The two directions get a fresh pipe each, assigned crosswise, and
    /// both sockets flip to the connected state before the connector is
    /// woken.
    pub(crate) fn accept(self: &Arc<Self>) -> Result<Arc<StreamSocket>> {
        let this_listener = match &*self.state.read() {
            State::Listener(listener) => listener.clone(),
            _ => return_errno_with_message!(Errno::EINVAL, "the socket is not listening"),
        };

        let request = this_listener.wait_request()?;
        let connector = request.connector().clone();

        let accepted = Self::with_port(this_listener.port());
        let to_acceptor = Arc::new(Pipe::new());
        let from_acceptor = Arc::new(Pipe::new());

        *connector.state.write() = State::Peer(Arc::new(Peer::new(
            Arc::downgrade(&accepted),
            from_acceptor.clone(),
            to_acceptor.clone(),
        )));
        *accepted.state.write() = State::Peer(Arc::new(Peer::new(
            Arc::downgrade(&connector),
            to_acceptor,
            from_acceptor,
        )));

        request.admit();
        Ok(accepted)
    }

    /// Requests a connection to the listener at `port` and waits for
    /// admission. `None` means no timeout.
    pub(crate) fn connect(self: &Arc<Self>, port: Port, timeout: Option<Duration>) -> Result<()> {
        match &*self.state.read() {
            State::Unbound => (),
            State::Listener(_) => {
                return_errno_with_message!(Errno::EINVAL, "a listening socket cannot connect")
            }
            State::Peer(_) => {
                return_errno_with_message!(Errno::EISCONN, "the socket is already connected")
            }
        }
        if port == NOPORT || port > MAX_PORT {
            return_errno_with_message!(Errno::EINVAL, "the port is out of range");
        }

        let remote = listener::get(port).ok_or(Error::with_message(
            Errno::ECONNREFUSED,
            "no listener is published on the port",
        ))?;

        let request = Arc::new(ConnRequest::new(self.clone()));
        remote.enqueue(request.clone());

        // On expiry the request stays queued; listener close reaps it.
        request.wait_admitted(timeout)
    }

    /// Shuts down one or both directions of a connected socket.
    pub(crate) fn shutdown(&self, cmd: ShutdownCmd) -> Result<()> {
        let peer = match &*self.state.read() {
            State::Peer(peer) => peer.clone(),
            _ => return_errno_with_message!(Errno::ENOTCONN, "the socket is not connected"),
        };
        peer.shutdown(cmd);
        Ok(())
    }
}

impl FileLike for StreamSocket {
    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let peer = match &*self.state.read() {
            State::Peer(peer) => peer.clone(),
            _ => return_errno_with_message!(Errno::ENOTCONN, "the socket is not connected"),
        };
        peer.read(buf)
    }

    fn write(&self, buf: &[u8]) -> Result<usize> {
        let peer = match &*self.state.read() {
            State::Peer(peer) => peer.clone(),
            _ => return_errno_with_message!(Errno::ENOTCONN, "the socket is not connected"),
        };
        peer.write(buf)
    }

    /// Closing a peer closes both pipe ends; closing a listener
    /// unpublishes the port, discards pending requests, and wakes any
    /// blocked accept. Idempotent, so the `Drop` backstop is harmless.
    fn close(&self) {
        match &*self.state.read() {
            State::Peer(peer) => peer.close(),
            State::Listener(listener) => listener.close(),
            State::Unbound => (),
        }
    }

    fn as_socket(self: Arc<Self>) -> Option<Arc<StreamSocket>> {
        Some(self)
    }
}

impl Drop for StreamSocket {
    fn drop(&mut self) {
        FileLike::close(self);
    }
}
