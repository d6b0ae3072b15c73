// SPDX-License-Identifier: MPL-2.0

use super::{process_table, Process, ProcessStatus};
use crate::prelude::*;

const INIT_PID: usize = 1;

/// Tears a process down once its last thread has exited.
///
/// Live children are reparented to init and exited ones spliced onto
/// init's zombie list; the process enqueues itself on its parent's zombie
/// list and wakes it; args and thread records are released and the block
/// marked zombie. The parent (or nobody, for the parentless processes)
/// later reaps the zombie through wait.
pub(crate) fn finalize_process(process: &Arc<Process>) {
    let pid = process.pid();
    trace!("process {} tearing down", pid);

    process_table::with(|table| {
        if pid > INIT_PID {
            let init = table.get(INIT_PID).expect("init cannot be gone");

            let (children, exited_children, parent) = {
                let mut inner = process.inner().lock();
                (
                    core::mem::take(&mut inner.children),
                    core::mem::take(&mut inner.exited_children),
                    inner.parent,
                )
            };

            for cpid in children {
                if let Some(child) = table.get(cpid) {
                    child.inner().lock().parent = Some(INIT_PID);
                }
                init.inner().lock().children.push(cpid);
            }

            if !exited_children.is_empty() {
                init.inner().lock().exited_children.extend(exited_children);
                init.child_exit().wake_all();
            }

            let parent = parent.and_then(|ppid| table.get(ppid));
            if let Some(parent) = parent {
                parent.inner().lock().exited_children.push_back(pid);
                parent.child_exit().wake_all();
            }
        }

        let mut inner = process.inner().lock();
        debug_assert_eq!(inner.live_threads, 0);
        inner.args = Vec::new().into_boxed_slice();
        // Records someone still intends to join stay until that join.
        inner.threads.retain(|thread| thread.has_joiners());
        inner.main_thread = None;
        inner.status = ProcessStatus::Zombie;
    });

    // Release the file ids outside the table lock; closing may wake
    // peers, and their wakeups should not contend with the table.
    let files = process.files().lock().close_all();
    drop(files);
}
