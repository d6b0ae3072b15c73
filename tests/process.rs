// SPDX-License-Identifier: MPL-2.0

//! Process lifecycle scenarios: exec trees, wait/reap, process-info
//! enumeration.

use mikros::*;
use zerocopy::FromBytes;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn exit_with_arg(args: &[u8]) -> i32 {
    args[0] as i32
}

fn fork_and_wait_main(_: &[u8]) -> i32 {
    for value in [1u8, 2, 3] {
        sys_exec(exit_with_arg, &[value]).unwrap();
    }

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let (_, status) = sys_wait_child(None).unwrap();
        statuses.push(status);
    }
    statuses.sort();
    assert_eq!(statuses, [1, 2, 3]);

    // All children reaped: the fourth wait has nothing to wait for.
    assert_eq!(sys_wait_child(None).unwrap_err().error(), Errno::ECHILD);
    0
}

#[test]
fn fork_and_wait_any() {
    init_logger();
    assert_eq!(boot(fork_and_wait_main, &[]), 0);
}

fn identity_child(_: &[u8]) -> i32 {
    // Exec'd by init, so our parent is pid 1.
    assert_eq!(sys_get_ppid(), Some(1));
    sys_get_pid() as i32
}

fn specific_wait_main(_: &[u8]) -> i32 {
    assert_eq!(sys_get_pid(), 1);
    assert_eq!(sys_get_ppid(), None);

    let first = sys_exec(identity_child, &[]).unwrap();
    let second = sys_exec(identity_child, &[]).unwrap();

    // Wait for the *second* child by pid; the first stays a zombie.
    let (reaped, status) = sys_wait_child(Some(second)).unwrap();
    assert_eq!(reaped, second);
    assert_eq!(status, second as i32);

    // A pid that is not our child (our own) is rejected.
    assert_eq!(sys_wait_child(Some(1)).unwrap_err().error(), Errno::ECHILD);
    // So is an already-reaped pid.
    assert_eq!(
        sys_wait_child(Some(second)).unwrap_err().error(),
        Errno::ECHILD
    );

    let (reaped, status) = sys_wait_child(Some(first)).unwrap();
    assert_eq!(reaped, first);
    assert_eq!(status, first as i32);
    0
}

#[test]
fn wait_for_specific_child() {
    init_logger();
    assert_eq!(boot(specific_wait_main, &[]), 0);
}

fn orphan_grandchild(_: &[u8]) -> i32 {
    // Outlive our parent; init will adopt and reap us.
    while sys_get_ppid() != Some(1) {
        std::thread::yield_now();
    }
    7
}

fn orphaning_child(_: &[u8]) -> i32 {
    sys_exec(orphan_grandchild, &[]).unwrap();
    0
}

fn reparent_main(_: &[u8]) -> i32 {
    let child = sys_exec(orphaning_child, &[]).unwrap();
    let (reaped, _) = sys_wait_child(Some(child)).unwrap();
    assert_eq!(reaped, child);
    // The grandchild is now init's (ours); reap it too.
    let (_, status) = sys_wait_child(None).unwrap();
    assert_eq!(status, 7);
    0
}

#[test]
fn orphans_are_reparented_to_init() {
    init_logger();
    assert_eq!(boot(reparent_main, &[]), 0);
}

static ENUMERATION_DONE: core::sync::atomic::AtomicBool =
    core::sync::atomic::AtomicBool::new(false);

fn procinfo_child(_: &[u8]) -> i32 {
    // Stay alive until the parent has taken its snapshots.
    while !ENUMERATION_DONE.load(core::sync::atomic::Ordering::Acquire) {
        std::thread::yield_now();
    }
    0
}

fn procinfo_main(args: &[u8]) -> i32 {
    let child = sys_exec(procinfo_child, b"cargs").unwrap();

    let fid = sys_open_info().unwrap();
    let mut buf = [0u8; 256];
    let mut seen = Vec::new();
    loop {
        let n = sys_read(fid, &mut buf).unwrap();
        if n == 0 {
            break;
        }
        let info = ProcInfo::read_from_bytes(&buf[..n]).unwrap();
        seen.push(info);
    }
    sys_close(fid).unwrap();

    // The cursor walked pid order: idle, init, the child.
    let pids: Vec<u64> = seen.iter().map(|info| info.pid).collect();
    assert_eq!(pids, [0, 1, child as u64]);

    let idle = &seen[0];
    assert_eq!(idle.ppid, NO_PARENT);
    assert_eq!(idle.main_task, 0);
    assert_eq!(idle.thread_count, 0);
    assert_eq!(idle.alive, 1);

    let init = &seen[1];
    assert_eq!(init.ppid, NO_PARENT);
    assert_eq!(init.argl, args.len() as u64);
    assert_eq!(&init.args[..4], b"init");
    assert_eq!(init.thread_count, 1);

    let snap = &seen[2];
    assert_eq!(snap.ppid, 1);
    assert_eq!(snap.alive, 1);
    assert_eq!(&snap.args[..5], b"cargs");
    assert_ne!(snap.main_task, 0);

    // The write operation of the info stream is a trap.
    let fid = sys_open_info().unwrap();
    assert_eq!(sys_write(fid, b"x").unwrap_err().error(), Errno::EBADF);
    // A buffer smaller than one record is rejected.
    assert_eq!(
        sys_read(fid, &mut buf[..8]).unwrap_err().error(),
        Errno::EINVAL
    );
    sys_close(fid).unwrap();

    ENUMERATION_DONE.store(true, core::sync::atomic::Ordering::Release);
    sys_wait_child(Some(child)).unwrap();
    0
}

#[test]
fn procinfo_enumerates_the_table() {
    init_logger();
    assert_eq!(boot(procinfo_main, b"init"), 0);
}

static CHILD_MAY_EXIT: core::sync::atomic::AtomicBool =
    core::sync::atomic::AtomicBool::new(false);

fn zombie_child(_: &[u8]) -> i32 {
    while !CHILD_MAY_EXIT.load(core::sync::atomic::Ordering::Acquire) {
        std::thread::yield_now();
    }
    9
}

fn zombie_invariant_main(_: &[u8]) -> i32 {
    let child = sys_exec(zombie_child, &[]).unwrap();
    let pcb = mikros::process::process_table::get_process(child).unwrap();

    // While the child is alive its record holds the main thread.
    assert!(!pcb.is_zombie());
    assert!(pcb.main_thread().is_some());

    CHILD_MAY_EXIT.store(true, core::sync::atomic::Ordering::Release);
    while !pcb.is_zombie() {
        std::thread::yield_now();
    }
    // Zombie: no main thread and no live threads, until reaped.
    assert!(pcb.main_thread().is_none());

    let fid = sys_open_info().unwrap();
    let mut buf = [0u8; 256];
    loop {
        let n = sys_read(fid, &mut buf).unwrap();
        assert_ne!(n, 0, "the unreaped zombie must still be enumerated");
        let info = ProcInfo::read_from_bytes(&buf[..n]).unwrap();
        if info.pid == child as u64 {
            assert_eq!(info.alive, 0);
            assert_eq!(info.thread_count, 0);
            break;
        }
    }
    sys_close(fid).unwrap();

    let (reaped, status) = sys_wait_child(Some(child)).unwrap();
    assert_eq!((reaped, status), (child, 9));
    0
}

#[test]
fn zombies_hold_no_threads() {
    init_logger();
    assert_eq!(boot(zombie_invariant_main, &[]), 0);
}

fn exit_status_main(_: &[u8]) -> i32 {
    41 + 1
}

#[test]
fn boot_returns_inits_exit_status() {
    init_logger();
    assert_eq!(boot(exit_status_main, &[]), 42);
}
