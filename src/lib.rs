// SPDX-License-Identifier: MPL-2.0

//! The core of a small educational operating-system kernel.
//!
//! The kernel implements the process and thread lifecycle, byte-oriented
//! pipes, and stream sockets layered on top of those pipes. The three
//! subsystems meet in a common stream abstraction: every open pipe end,
//! socket, or process-info stream is an object behind a per-process file
//! id, dispatched through the [`fs::file_handle::FileLike`] operation
//! table.
//!
//! The kernel runs hosted: kernel threads are host threads, and the
//! scheduler seam lives in [`sched`] and [`sync`]. [`boot`] brings the
//! process table up, runs an init task as pid 1, and returns its exit
//! status once every kernel thread has terminated.

pub mod error;
pub mod fs;
pub mod net;
pub mod prelude;
pub mod process;
pub mod sched;
pub mod sync;
pub mod syscall;
pub mod thread;

mod boot;

pub use boot::boot;
pub use error::{Errno, Error};
pub use fs::{
    file_table::{Fid, MAX_FILEID},
    pipe::PIPE_BUF_SIZE,
    procinfo::{ProcInfo, NO_PARENT, PROCINFO_MAX_ARGS_SIZE},
};
pub use net::socket::{Port, ShutdownCmd, MAX_PORT, NOPORT};
pub use process::{process_table::MAX_PROC, Pid, Task};
pub use syscall::{
    pipe::{sys_pipe, PipeFds},
    process::{sys_exec, sys_exit, sys_get_pid, sys_get_ppid, sys_open_info, sys_wait_child},
    socket::{sys_accept, sys_connect, sys_listen, sys_shutdown, sys_socket},
    stream::{sys_close, sys_dup2, sys_read, sys_write},
    thread::{sys_create_thread, sys_thread_detach, sys_thread_exit, sys_thread_join, sys_thread_self},
};
pub use thread::Tid;
