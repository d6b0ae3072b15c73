// SPDX-License-Identifier: MPL-2.0

//! Thread lifecycle within a process: creation, join, detach, exit.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::{prelude::*, process, process::Process, sched, sync::WaitQueue};

/// A thread id: the opaque identity of a thread record. Ids are never
/// reused, so a stale one fails join/detach instead of naming a stranger.
pub type Tid = u64;

static TID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

fn allocate_tid() -> Tid {
    TID_ALLOCATOR.fetch_add(1, Ordering::SeqCst)
}

/// The thread control block.
///
/// Owned by its process's thread list; a record outlives its thread's
/// exit while joiners still intend to collect the exit value, and is
/// released by the last joiner out (or by process teardown).
pub struct Thread {
    tid: Tid,
    process: Weak<Process>,
    task: process::Task,
    args: Box<[u8]>,
    /// Wakes joiners when the thread exits or is detached.
    exit_wq: WaitQueue,
    inner: Mutex<ThreadInner>,
}

struct ThreadInner {
    exited: bool,
    detached: bool,
    exit_code: i32,
    /// Number of threads currently blocked joining this one.
    joiners: u32,
}

impl Thread {
    pub(crate) fn new(process: Weak<Process>, task: process::Task, args: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            tid: allocate_tid(),
            process,
            task,
            args: Box::from(args),
            exit_wq: WaitQueue::new(),
            inner: Mutex::new(ThreadInner {
                exited: false,
                detached: false,
                exit_code: 0,
                joiners: 0,
            }),
        })
    }

    pub fn tid(&self) -> Tid {
        self.tid
    }

    pub(crate) fn run_task(&self) -> i32 {
        (self.task)(&self.args)
    }

    pub(crate) fn has_joiners(&self) -> bool {
        self.inner.lock().joiners >= 1
    }
}

/// Returns the current thread.
pub fn current() -> Arc<Thread> {
    sched::current_thread()
}

/// Creates a thread in the current process running `task(args)`; the
/// value the task returns becomes the thread's exit value.
pub(crate) fn create(task: process::Task, args: &[u8]) -> Result<Tid> {
    let process = current!();
    let thread = Thread::new(Arc::downgrade(&process), task, args);
    let tid = thread.tid();

    {
        let mut inner = process.inner().lock();
        inner.threads.push(thread.clone());
        inner.live_threads += 1;
    }

    let entry = thread.clone();
    sched::spawn_kernel_thread(process, thread, move || {
        let code = entry.run_task();
        crate::syscall::thread::sys_thread_exit(code);
    });

    Ok(tid)
}

/// Joins a thread of the current process and returns its exit value.
pub(crate) fn join(tid: Tid) -> Result<i32> {
    let this = current_thread!();
    if this.tid() == tid {
        return_errno_with_message!(Errno::EDEADLK, "a thread cannot join itself");
    }

    let process = current!();
    let target = find(&process, tid)?;
    {
        let mut inner = target.inner.lock();
        if inner.detached {
            return_errno_with_message!(Errno::EINVAL, "the thread is detached");
        }
        inner.joiners += 1;
    }

    // Detach wins over exit: a joiner woken by either reports detach.
    let detached = target.exit_wq.wait_until(|| {
        let inner = target.inner.lock();
        if inner.detached {
            Some(true)
        } else if inner.exited {
            Some(false)
        } else {
            None
        }
    });

    let (exit_code, last_joiner) = {
        let mut inner = target.inner.lock();
        inner.joiners = inner.joiners.saturating_sub(1);
        (inner.exit_code, inner.joiners == 0)
    };

    if detached {
        return_errno_with_message!(Errno::EINVAL, "the thread was detached while being joined");
    }

    if last_joiner {
        // The exit value has been collected; release the record.
        process.inner().lock().threads.retain(|t| t.tid() != tid);
    }

    Ok(exit_code)
}

/// Detaches a thread of the current process: joining it becomes illegal,
/// and joiners already waiting give up.
pub(crate) fn detach(tid: Tid) -> Result<()> {
    let process = current!();
    let target = find(&process, tid)?;

    {
        let mut inner = target.inner.lock();
        if inner.exited {
            return_errno_with_message!(Errno::EINVAL, "the thread has already exited");
        }
        inner.detached = true;
        inner.joiners = 0;
    }
    target.exit_wq.wake_all();
    Ok(())
}

/// Terminates the current thread with `code`.
///
/// The last thread out also tears the process down. Never returns: the
/// kernel thread unwinds back to the scheduler seam.
pub(crate) fn do_exit(code: i32) -> ! {
    let process = current!();
    let thread = current_thread!();

    {
        let mut inner = thread.inner.lock();
        inner.exited = true;
        inner.exit_code = code;
    }
    thread.exit_wq.wake_all();

    let was_last = {
        let mut inner = process.inner().lock();
        inner.live_threads -= 1;
        inner.live_threads == 0
    };

    if was_last {
        process::finalize_process(&process);
    }

    sched::exit_current_thread()
}

fn find(process: &Arc<Process>, tid: Tid) -> Result<Arc<Thread>> {
    process
        .inner()
        .lock()
        .threads
        .iter()
        .find(|thread| thread.tid() == tid)
        .cloned()
        .ok_or(Error::with_message(
            Errno::ESRCH,
            "no such thread in the process",
        ))
}
