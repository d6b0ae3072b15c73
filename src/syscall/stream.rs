// SPDX-License-Identifier: MPL-2.0

use crate::{fs::file_table::Fid, prelude::*};

/// Reads from the stream behind `fid`. What "read" means — and whether
/// it blocks — is the stream's business; a stream with no read operation
/// fails with `EBADF`.
pub fn sys_read(fid: Fid, buf: &mut [u8]) -> Result<usize> {
    let file = current!().files().lock().get(fid)?;
    file.read(buf)
}

/// Writes to the stream behind `fid`.
pub fn sys_write(fid: Fid, buf: &[u8]) -> Result<usize> {
    let file = current!().files().lock().get(fid)?;
    file.write(buf)
}

/// Releases the fid. The stream's close runs once the last fid sharing
/// the record is gone; operations still blocked on the stream observe it.
pub fn sys_close(fid: Fid) -> Result<()> {
    debug!("sys_close: fid = {}", fid);
    let entry = current!().files().lock().close(fid)?;
    // Drop outside the table lock: the close may wake peers.
    drop(entry);
    Ok(())
}

/// Makes `new` name the same open stream as `old`, closing whatever
/// `new` named before. Returns `new`.
pub fn sys_dup2(old: Fid, new: Fid) -> Result<Fid> {
    debug!("sys_dup2: old = {}, new = {}", old, new);
    let replaced = current!().files().lock().dup2(old, new)?;
    drop(replaced);
    Ok(new)
}
