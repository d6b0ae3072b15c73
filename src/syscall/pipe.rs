// SPDX-License-Identifier: MPL-2.0

use crate::{
    fs::{file_table::Fid, pipe},
    prelude::*,
};

/// The two file ids of a freshly assembled pipe.
#[derive(Debug, Clone, Copy)]
pub struct PipeFds {
    pub read: Fid,
    pub write: Fid,
}

/// Creates a pipe and installs its two ends in the current process's
/// file table, read end first.
pub fn sys_pipe() -> Result<PipeFds> {
    let (reader, writer) = pipe::new_pair();

    let (read, write) = current!().files().lock().insert_pair(reader, writer)?;
    debug!("sys_pipe: read fid = {}, write fid = {}", read, write);

    Ok(PipeFds { read, write })
}
