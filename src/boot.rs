// SPDX-License-Identifier: MPL-2.0

use std::sync::Mutex as HostMutex;

use crate::{
    net::socket,
    prelude::*,
    process::{self, process_table, Task},
    sched,
};

lazy_static! {
    static ref BOOT_LOCK: HostMutex<()> = HostMutex::new(());
}

/// Boots the kernel and runs `task(args)` as the init process.
///
/// Brings up the process table with the idle process at pid 0 and init at
/// pid 1, then blocks until every kernel thread has exited. Returns
/// init's exit status and tears the kernel state down so a later boot
/// starts from nothing. Concurrent boots serialize.
pub fn boot(task: Task, args: &[u8]) -> i32 {
    let _kernel = BOOT_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    process_table::with(|table| table.reset());
    socket::clear_port_map();
    info!("kernel booting");

    // The idle process: parentless, threadless, alive for the whole run.
    let idle = process::spawn(None, &[]).expect("an empty process table cannot refuse the idle process");
    if idle != 0 {
        panic!("the idle process was not assigned pid 0");
    }

    let init = process::spawn(Some(task), args)
        .expect("an empty process table cannot refuse the init process");
    if init != 1 {
        panic!("the init process was not assigned pid 1");
    }

    sched::wait_all_exited();

    let exit_code = process_table::with(|table| table.get(init))
        .and_then(|process| process.exit_code())
        .unwrap_or(0);
    info!("kernel halted; init exited with {}", exit_code);

    process_table::with(|table| table.reset());
    socket::clear_port_map();

    exit_code
}
