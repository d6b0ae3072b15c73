// SPDX-License-Identifier: MPL-2.0

//! Process lifecycle: the control block, spawning, exiting, waiting.

mod exit;
pub mod process_table;
mod wait;

pub(crate) use exit::finalize_process;
pub(crate) use wait::wait_child;

use crate::{
    fs::file_table::FileTable,
    prelude::*,
    sched,
    sync::WaitQueue,
    thread::Thread,
};

/// A process id: the index of the control block in the process table.
pub type Pid = usize;

/// A task entry point. The argument is the args blob the spawner passed;
/// the return value becomes the exit status.
pub type Task = fn(&[u8]) -> i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// At least one thread has not exited (or the process never had one).
    Alive,
    /// All threads exited; the control block awaits reaping.
    Zombie,
}

/// The process control block.
pub struct Process {
    pid: Pid,
    /// Wakes parents blocked in wait when a child of theirs exits.
    child_exit: WaitQueue,
    files: Mutex<FileTable>,
    inner: Mutex<ProcessInner>,
}

pub(crate) struct ProcessInner {
    pub(crate) status: ProcessStatus,
    pub(crate) parent: Option<Pid>,
    /// Live and zombie children, until reaped.
    pub(crate) children: Vec<Pid>,
    /// The zombie subset, in exit order.
    pub(crate) exited_children: VecDeque<Pid>,
    /// Thread records of this process, drained at teardown.
    pub(crate) threads: Vec<Arc<Thread>>,
    /// Count of threads that have not exited.
    pub(crate) live_threads: usize,
    /// The record of the thread running the main task; disconnected at
    /// teardown, so a zombie holds none.
    pub(crate) main_thread: Option<Arc<Thread>>,
    pub(crate) main_task: Option<Task>,
    /// The args blob, owned by the control block.
    pub(crate) args: Box<[u8]>,
    pub(crate) exit_code: Option<i32>,
}

impl Process {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn parent_pid(&self) -> Option<Pid> {
        self.inner.lock().parent
    }

    pub fn is_zombie(&self) -> bool {
        self.inner.lock().status == ProcessStatus::Zombie
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.inner.lock().exit_code
    }

    pub fn main_thread(&self) -> Option<Arc<Thread>> {
        self.inner.lock().main_thread.clone()
    }

    pub(crate) fn set_exit_code(&self, code: i32) {
        self.inner.lock().exit_code = Some(code);
    }

    pub(crate) fn files(&self) -> &Mutex<FileTable> {
        &self.files
    }

    pub(crate) fn inner(&self) -> &Mutex<ProcessInner> {
        &self.inner
    }

    pub(crate) fn child_exit(&self) -> &WaitQueue {
        &self.child_exit
    }
}

/// Returns the current process.
pub fn current() -> Arc<Process> {
    sched::current_process()
}

/// Creates a new process running `task(args)` and returns its pid.
///
/// Processes that get pid 0 or 1 — the idle and init processes made at
/// boot — are parentless and start with an empty file table. Every other
/// process is a child of the caller and inherits its open file ids.
/// `task` is `None` only for the idle process, which has no thread.
pub(crate) fn spawn(task: Option<Task>, args: &[u8]) -> Result<Pid> {
    let (process, main_thread) = process_table::with(|table| -> Result<_> {
        let pid = table.acquire()?;

        let (parent, files) = if pid <= 1 {
            (None, FileTable::new())
        } else {
            let parent = current!();
            let inherited_files = parent.files().lock().clone_for_spawn();
            (Some(parent.pid()), inherited_files)
        };

        let process = Arc::new(Process {
            pid,
            child_exit: WaitQueue::new(),
            files: Mutex::new(files),
            inner: Mutex::new(ProcessInner {
                status: ProcessStatus::Alive,
                parent,
                children: Vec::new(),
                exited_children: VecDeque::new(),
                threads: Vec::new(),
                live_threads: 0,
                main_thread: None,
                main_task: task,
                args: Box::from(args),
                exit_code: None,
            }),
        });

        if let Some(ppid) = parent {
            let parent_process = table.get(ppid).expect("the parent cannot be gone");
            parent_process.inner.lock().children.push(pid);
        }

        table.install(pid, process.clone());

        let main_thread = task.map(|task| {
            let thread = Thread::new(Arc::downgrade(&process), task, args);
            let mut inner = process.inner.lock();
            inner.threads.push(thread.clone());
            inner.live_threads = 1;
            inner.main_thread = Some(thread.clone());
            thread
        });

        Ok((process, main_thread))
    })?;

    // Wake the main thread last: once it runs, the control block must be
    // fully initialized.
    if let Some(thread) = main_thread {
        let entry = thread.clone();
        sched::spawn_kernel_thread(process.clone(), thread, move || {
            let code = entry.run_task();
            crate::syscall::process::sys_exit(code);
        });
    }

    Ok(process.pid())
}
