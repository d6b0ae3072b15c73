// SPDX-License-Identifier: MPL-2.0

//! The global process table: a fixed arena of control-block slots indexed
//! by pid, with a free list. The arena owns the control blocks; the
//! parent/child links inside them are lookup structure only.

use super::{Pid, Process};
use crate::prelude::*;

/// The fixed number of process-table slots.
pub const MAX_PROC: usize = 512;

lazy_static! {
    static ref PROCESS_TABLE: Mutex<ProcessTable> = Mutex::new(ProcessTable::new());
}

pub(crate) struct ProcessTable {
    slots: Vec<Option<Arc<Process>>>,
    /// Stack of free pids, topped by the lowest, so the first two
    /// acquisitions at boot yield pid 0 and pid 1.
    free: Vec<Pid>,
}

impl ProcessTable {
    fn new() -> Self {
        Self {
            slots: (0..MAX_PROC).map(|_| None).collect(),
            free: (0..MAX_PROC).rev().collect(),
        }
    }

    /// Takes a free slot. The caller must `install` a control block into
    /// it before releasing the table lock.
    pub(crate) fn acquire(&mut self) -> Result<Pid> {
        self.free
            .pop()
            .ok_or(Error::with_message(Errno::EAGAIN, "the process table is full"))
    }

    pub(crate) fn install(&mut self, pid: Pid, process: Arc<Process>) {
        debug_assert!(self.slots[pid].is_none());
        self.slots[pid] = Some(process);
    }

    /// Returns the slot to the free list (reaping, or boot teardown).
    pub(crate) fn release(&mut self, pid: Pid) {
        if self.slots[pid].take().is_some() {
            self.free.push(pid);
        }
    }

    pub(crate) fn get(&self, pid: Pid) -> Option<Arc<Process>> {
        self.slots.get(pid).and_then(|slot| slot.clone())
    }

    /// The lowest occupied slot with pid >= `from`; the ProcInfo cursor.
    pub(crate) fn next_occupied(&self, from: Pid) -> Option<Arc<Process>> {
        self.slots
            .iter()
            .skip(from)
            .find_map(|slot| slot.clone())
    }

    /// Drops every control block and rebuilds the free list.
    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Runs `f` with the table lock held.
///
/// Lock order: the table lock is taken first; per-process locks nest
/// inside it, one at a time. Never take the table lock while holding a
/// per-process lock.
pub(crate) fn with<R>(f: impl FnOnce(&mut ProcessTable) -> R) -> R {
    f(&mut PROCESS_TABLE.lock())
}

/// Gets a process with `pid`.
pub fn get_process(pid: Pid) -> Option<Arc<Process>> {
    PROCESS_TABLE.lock().get(pid)
}
