// SPDX-License-Identifier: MPL-2.0

use core::mem::size_of;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::file_handle::FileLike;
use crate::{
    prelude::*,
    process::{process_table, Pid, Process, ProcessStatus},
};

/// How many leading bytes of a process's args blob a snapshot carries.
pub const PROCINFO_MAX_ARGS_SIZE: usize = 128;

/// The `ppid` a snapshot reports for a parentless process.
pub const NO_PARENT: u64 = u64::MAX;

/// One process-table snapshot record, in the exact layout consumers see.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct ProcInfo {
    pub pid: u64,
    pub ppid: u64,
    /// 1 while the process is alive, 0 once it is a zombie.
    pub alive: u32,
    pub thread_count: u32,
    /// Address of the main task's entry point, 0 when the process has
    /// none (the idle process).
    pub main_task: u64,
    /// Length of the process's args blob (not the truncated copy below).
    pub argl: u64,
    pub args: [u8; PROCINFO_MAX_ARGS_SIZE],
}

/// A read-only stream enumerating the occupied process-table slots.
///
/// Every read yields exactly one record and advances the cursor to the
/// next occupied slot; an exhausted table reads as end of stream.
pub struct ProcInfoStream {
    cursor: Mutex<Pid>,
}

impl ProcInfoStream {
    pub(crate) fn new() -> Self {
        Self {
            cursor: Mutex::new(0),
        }
    }

    fn snapshot(process: &Arc<Process>) -> ProcInfo {
        let mut info = ProcInfo {
            pid: process.pid() as u64,
            ppid: NO_PARENT,
            alive: 0,
            thread_count: 0,
            main_task: 0,
            argl: 0,
            args: [0; PROCINFO_MAX_ARGS_SIZE],
        };

        let inner = process.inner().lock();
        if let Some(ppid) = inner.parent {
            info.ppid = ppid as u64;
        }
        if let Some(task) = inner.main_task {
            info.main_task = task as usize as u64;
        }
        info.argl = inner.args.len() as u64;
        info.alive = (inner.status == ProcessStatus::Alive) as u32;
        info.thread_count = inner.live_threads as u32;
        let copied = inner.args.len().min(PROCINFO_MAX_ARGS_SIZE);
        info.args[..copied].copy_from_slice(&inner.args[..copied]);

        info
    }
}

impl FileLike for ProcInfoStream {
    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let record_len = size_of::<ProcInfo>();
        if buf.len() < record_len {
            return_errno_with_message!(Errno::EINVAL, "the buffer cannot hold a snapshot record");
        }

        let mut cursor = self.cursor.lock();
        let Some(process) = process_table::with(|table| table.next_occupied(*cursor)) else {
            return Ok(0);
        };
        *cursor = process.pid() + 1;

        let info = Self::snapshot(&process);
        buf[..record_len].copy_from_slice(info.as_bytes());
        Ok(record_len)
    }
}
