// SPDX-License-Identifier: MPL-2.0

use super::{process_table, process_table::ProcessTable, Pid, Process, ProcessStatus};
use crate::prelude::*;

/// Waits for a child to exit and reaps it.
///
/// `filter` of `None` waits for any child: the call blocks until a child
/// turns zombie (reaping the one that exited first) or until there is no
/// child left to wait for (`ECHILD`). Naming a pid waits for that
/// specific child; a pid that is not a child of the caller is `ECHILD`
/// immediately.
///
/// Returns the reaped child's pid and exit status.
pub(crate) fn wait_child(filter: Option<Pid>) -> Result<(Pid, i32)> {
    let process = current!();
    match filter {
        Some(cpid) => wait_for_specific_child(process, cpid),
        None => wait_for_any_child(process),
    }
}

fn wait_for_any_child(process: Arc<Process>) -> Result<(Pid, i32)> {
    process.child_exit().wait_until(|| {
        process_table::with(|table| {
            let mut inner = process.inner().lock();
            if let Some(cpid) = inner.exited_children.pop_front() {
                inner.children.retain(|&c| c != cpid);
                drop(inner);
                return Some(Ok(reap(table, cpid)));
            }
            if inner.children.is_empty() {
                return Some(Err(Error::with_message(
                    Errno::ECHILD,
                    "the process has no children",
                )));
            }
            None
        })
    })
}

fn wait_for_specific_child(process: Arc<Process>, cpid: Pid) -> Result<(Pid, i32)> {
    // Legality check up front: the pid must name a child of ours.
    let is_child = process_table::with(|table| {
        table
            .get(cpid)
            .is_some_and(|child| child.inner().lock().parent == Some(process.pid()))
    });
    if !is_child {
        return_errno_with_message!(Errno::ECHILD, "the pid is not a child of the process");
    }

    process.child_exit().wait_until(|| {
        process_table::with(|table| {
            let Some(child) = table.get(cpid) else {
                // Another thread of ours won the race and reaped it.
                return Some(Err(Error::with_message(
                    Errno::ECHILD,
                    "the child was already reaped",
                )));
            };
            if child.inner().lock().status == ProcessStatus::Alive {
                return None;
            }
            let mut inner = process.inner().lock();
            inner.children.retain(|&c| c != cpid);
            inner.exited_children.retain(|&c| c != cpid);
            drop(inner);
            Some(Ok(reap(table, cpid)))
        })
    })
}

/// Releases a zombie's control block back to the free list.
fn reap(table: &mut ProcessTable, cpid: Pid) -> (Pid, i32) {
    let child = table.get(cpid).expect("the zombie cannot be gone");
    debug_assert!(child.is_zombie());
    let code = child.exit_code().unwrap_or(0);
    table.release(cpid);
    (cpid, code)
}
