// SPDX-License-Identifier: MPL-2.0

use crate::{
    prelude::*,
    process::Task,
    thread::{self, Tid},
};

/// Creates a thread in the current process and returns its tid.
pub fn sys_create_thread(task: Task, args: &[u8]) -> Result<Tid> {
    debug!("sys_create_thread: argl = {}", args.len());
    thread::create(task, args)
}

pub fn sys_thread_self() -> Tid {
    current_thread!().tid()
}

/// Waits for a thread of the current process to exit and returns its
/// exit value.
pub fn sys_thread_join(tid: Tid) -> Result<i32> {
    debug!("sys_thread_join: tid = {}", tid);
    thread::join(tid)
}

/// Makes a thread of the current process unjoinable.
pub fn sys_thread_detach(tid: Tid) -> Result<()> {
    debug!("sys_thread_detach: tid = {}", tid);
    thread::detach(tid)
}

/// Terminates the current thread with exit value `code`.
pub fn sys_thread_exit(code: i32) -> ! {
    debug!("sys_thread_exit: code = {}", code);
    thread::do_exit(code)
}
