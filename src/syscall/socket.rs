// SPDX-License-Identifier: MPL-2.0

use crate::{
    fs::file_table::Fid,
    net::socket::{Port, ShutdownCmd, StreamSocket},
    prelude::*,
};

/// Creates an unbound socket, bound to `port` unless it is `NOPORT`, and
/// returns its fid.
pub fn sys_socket(port: Port) -> Result<Fid> {
    debug!("sys_socket: port = {}", port);
    let socket = StreamSocket::new(port)?;
    current!().files().lock().insert(socket)
}

/// Publishes the socket as the listener of its bound port.
pub fn sys_listen(fid: Fid) -> Result<()> {
    debug!("sys_listen: fid = {}", fid);
    resolve_socket(fid)?.listen()
}

/// Waits for a connection on a listening socket and returns the fid of
/// the accepted peer socket.
pub fn sys_accept(fid: Fid) -> Result<Fid> {
    debug!("sys_accept: fid = {}", fid);
    let socket = resolve_socket(fid)?;

    // Fail before blocking when no fid could hold the accepted socket.
    if !current!().files().lock().has_free_slot() {
        return_errno_with_message!(Errno::EMFILE, "no free file id for the accepted socket");
    }

    let accepted = socket.accept()?;
    current!().files().lock().insert(accepted)
}

/// Connects an unbound socket to the listener at `port`, waiting up to
/// `timeout` (`None` means forever) for the listener to accept.
pub fn sys_connect(fid: Fid, port: Port, timeout: Option<Duration>) -> Result<()> {
    debug!(
        "sys_connect: fid = {}, port = {}, timeout = {:?}",
        fid, port, timeout
    );
    resolve_socket(fid)?.connect(port, timeout)
}

/// Shuts down one or both directions of a connected socket.
pub fn sys_shutdown(fid: Fid, how: ShutdownCmd) -> Result<()> {
    debug!("sys_shutdown: fid = {}, how = {:?}", fid, how);
    resolve_socket(fid)?.shutdown(how)
}

fn resolve_socket(fid: Fid) -> Result<Arc<StreamSocket>> {
    let file = current!().files().lock().get(fid)?;
    file.as_socket().ok_or(Error::with_message(
        Errno::ENOTSOCK,
        "the fid does not name a socket",
    ))
}
