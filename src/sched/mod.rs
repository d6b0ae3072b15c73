// SPDX-License-Identifier: MPL-2.0

//! The scheduler seam of the hosted kernel.
//!
//! Kernel threads are host threads. This module owns the mapping from the
//! running host thread to its kernel identity (the current process and
//! thread control blocks), spawns new kernel threads, and tracks how many
//! are still alive so that [`crate::boot`] can wait for a full drain.

use std::{
    cell::RefCell,
    panic::{self, AssertUnwindSafe},
    thread as host,
};

use crate::{prelude::*, process::Process, sync::WaitQueue, thread::Thread};

std::thread_local! {
    static CURRENT: RefCell<Option<(Arc<Process>, Arc<Thread>)>> = RefCell::new(None);
}

/// The unwind payload `sys_exit`/`sys_thread_exit` use to terminate the
/// calling kernel thread from arbitrary call depth. The spawn wrapper
/// catches it; anything else that unwinds is a genuine panic.
pub(crate) struct ExitToken;

/// Returns the process of the calling kernel thread.
///
/// Panics when called from a host thread that is not a kernel thread;
/// system calls are only legal from kernel threads.
pub fn current_process() -> Arc<Process> {
    CURRENT
        .with(|current| current.borrow().as_ref().map(|(process, _)| process.clone()))
        .expect("no current process on this thread")
}

/// Returns the thread control block of the calling kernel thread.
pub fn current_thread() -> Arc<Thread> {
    CURRENT
        .with(|current| current.borrow().as_ref().map(|(_, thread)| thread.clone()))
        .expect("no current thread on this thread")
}

/// Spawns a kernel thread bound to `process`/`thread` and wakes it.
///
/// `body` is the thread's whole life: it runs the task and must finish by
/// unwinding with [`ExitToken`] (via the exit system calls). The wrapper
/// installs the kernel identity before the body and retires the thread
/// from the live registry after it, whatever way the body ended.
pub(crate) fn spawn_kernel_thread<F>(process: Arc<Process>, thread: Arc<Thread>, body: F)
where
    F: FnOnce() + Send + 'static,
{
    REGISTRY.enter();

    let name = format!("kthread-{}", thread.tid());
    let spawned = host::Builder::new().name(name).spawn(move || {
        CURRENT.with(|current| *current.borrow_mut() = Some((process, thread)));

        let outcome = panic::catch_unwind(AssertUnwindSafe(body));

        CURRENT.with(|current| *current.borrow_mut() = None);
        REGISTRY.exit();

        match outcome {
            Ok(()) => error!("kernel thread body returned instead of exiting"),
            Err(payload) if payload.is::<ExitToken>() => (),
            Err(_) => {
                // The panic hook already reported it; the process this
                // thread belonged to is left un-torn-down.
                error!("kernel thread terminated by an unexpected panic");
            }
        }
    });
    spawned.expect("failed to spawn a kernel thread");
}

/// Terminates the calling kernel thread. All bookkeeping must already be
/// done; this only unwinds back to the spawn wrapper.
pub(crate) fn exit_current_thread() -> ! {
    panic::resume_unwind(Box::new(ExitToken))
}

/// Blocks until every kernel thread has terminated.
pub(crate) fn wait_all_exited() {
    REGISTRY
        .all_exited
        .wait_until(|| (*REGISTRY.live.lock() == 0).then_some(()));
}

static REGISTRY: Registry = Registry {
    live: Mutex::new(0),
    all_exited: WaitQueue::new(),
};

struct Registry {
    live: Mutex<usize>,
    all_exited: WaitQueue,
}

impl Registry {
    fn enter(&self) {
        *self.live.lock() += 1;
    }

    fn exit(&self) {
        let mut live = self.live.lock();
        *live -= 1;
        let drained = *live == 0;
        drop(live);
        if drained {
            self.all_exited.wake_all();
        }
    }
}
