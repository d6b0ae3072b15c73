// SPDX-License-Identifier: MPL-2.0

use super::{Port, StreamSocket, MAX_PORT};
use crate::{prelude::*, sync::WaitQueue};

/// The listening state of a stream socket.
///
/// Holds the FIFO queue of pending connection requests for its port.
/// A listener is "published" while the port map points at it; closing
/// unpublishes it, discards the queue, and wakes any blocked accept so it
/// can observe the closure.
pub(super) struct Listener {
    port: Port,
    backlog: Mutex<VecDeque<Arc<ConnRequest>>>,
    req_available: WaitQueue,
}

impl Listener {
    pub(super) fn new(port: Port) -> Self {
        Self {
            port,
            backlog: Mutex::new(VecDeque::new()),
            req_available: WaitQueue::new(),
        }
    }

    pub(super) fn port(&self) -> Port {
        self.port
    }

    pub(super) fn enqueue(&self, request: Arc<ConnRequest>) {
        self.backlog.lock().push_back(request);
        self.req_available.wake_one();
    }

    /// Blocks until a connection request is available or the listener is
    /// unpublished.
    pub(super) fn wait_request(self: &Arc<Self>) -> Result<Arc<ConnRequest>> {
        self.req_available.wait_until(|| {
            // Closure takes priority over a non-empty queue.
            if !is_published(self) {
                return Some(Err(Error::with_message(
                    Errno::ECONNABORTED,
                    "the listener was closed while waiting",
                )));
            }
            self.backlog.lock().pop_front().map(Ok)
        })
    }

    pub(super) fn close(self: &Arc<Self>) {
        unpublish(self);
        // Requests still queued were never admitted; their connectors run
        // into the connect timeout. Dropping the queue frees our share.
        self.backlog.lock().clear();
        self.req_available.wake_all();
    }
}

/// One pending connection, owned by the listener's queue and pinned by
/// the connector across its wait.
pub(super) struct ConnRequest {
    connector: Arc<StreamSocket>,
    admitted: Mutex<bool>,
    connected: WaitQueue,
}

impl ConnRequest {
    pub(super) fn new(connector: Arc<StreamSocket>) -> Self {
        Self {
            connector,
            admitted: Mutex::new(false),
            connected: WaitQueue::new(),
        }
    }

    pub(super) fn connector(&self) -> &Arc<StreamSocket> {
        &self.connector
    }

    /// Marks the request admitted and wakes the connector.
    pub(super) fn admit(&self) {
        *self.admitted.lock() = true;
        self.connected.wake_all();
    }

    /// Blocks the connector until admission, or until `timeout` expires.
    pub(super) fn wait_admitted(&self, timeout: Option<Duration>) -> Result<()> {
        self.connected.wait_until_or_timeout(
            || {
                let admitted = *self.admitted.lock();
                admitted.then_some(())
            },
            timeout,
        )
    }
}

lazy_static! {
    /// One slot per port; a slot holds the single published listener.
    static ref PORT_MAP: Mutex<Vec<Option<Arc<Listener>>>> =
        Mutex::new(vec![None; MAX_PORT as usize + 1]);
}

pub(super) fn publish(listener: &Arc<Listener>) -> Result<()> {
    let mut map = PORT_MAP.lock();
    let slot = &mut map[listener.port as usize];
    if slot.is_some() {
        return_errno_with_message!(Errno::EADDRINUSE, "the port already has a listener");
    }
    *slot = Some(listener.clone());
    Ok(())
}

pub(super) fn get(port: Port) -> Option<Arc<Listener>> {
    PORT_MAP.lock()[port as usize].clone()
}

pub(super) fn is_published(listener: &Arc<Listener>) -> bool {
    PORT_MAP.lock()[listener.port as usize]
        .as_ref()
        .is_some_and(|published| Arc::ptr_eq(published, listener))
}

fn unpublish(listener: &Arc<Listener>) {
    let mut map = PORT_MAP.lock();
    let slot = &mut map[listener.port as usize];
    if slot.as_ref().is_some_and(|published| Arc::ptr_eq(published, listener)) {
        *slot = None;
    }
}

/// Empties the whole map; part of kernel teardown.
pub(crate) fn clear_port_map() {
    PORT_MAP.lock().fill(None);
}
