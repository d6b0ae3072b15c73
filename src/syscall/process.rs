// SPDX-License-Identifier: MPL-2.0

use crate::{
    fs::{file_table::Fid, procinfo::ProcInfoStream},
    prelude::*,
    process::{self, Pid, Task},
    thread,
};

/// Creates a new process running `task(args)`, a child of the caller
/// that inherits its open file ids. Returns the new pid.
pub fn sys_exec(task: Task, args: &[u8]) -> Result<Pid> {
    debug!("sys_exec: argl = {}", args.len());
    process::spawn(Some(task), args)
}

/// Terminates the current process with status `code`.
///
/// The init process first drains every remaining child; orphans keep
/// getting reparented to it, so this also collects grandchildren.
pub fn sys_exit(code: i32) -> ! {
    debug!("sys_exit: code = {}", code);
    let current = current!();
    current.set_exit_code(code);

    if current.pid() == 1 {
        while process::wait_child(None).is_ok() {}
    }

    thread::do_exit(code)
}

/// Waits for a child to exit and reaps it; see [`process::wait_child`].
pub fn sys_wait_child(cpid: Option<Pid>) -> Result<(Pid, i32)> {
    debug!("sys_wait_child: cpid = {:?}", cpid);
    process::wait_child(cpid)
}

pub fn sys_get_pid() -> Pid {
    current!().pid()
}

pub fn sys_get_ppid() -> Option<Pid> {
    current!().parent_pid()
}

/// Opens a read-only stream of process-table snapshots.
pub fn sys_open_info() -> Result<Fid> {
    let fid = current!()
        .files()
        .lock()
        .insert(Arc::new(ProcInfoStream::new()))?;
    debug!("sys_open_info: fid = {}", fid);
    Ok(fid)
}
