// SPDX-License-Identifier: MPL-2.0

//! Thread lifecycle scenarios: join/detach matrices and last-thread
//! process teardown.

use core::sync::atomic::{AtomicBool, Ordering};

use mikros::*;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

static WORKERS_RELEASED: AtomicBool = AtomicBool::new(false);

fn gated_worker(args: &[u8]) -> i32 {
    while !WORKERS_RELEASED.load(Ordering::Acquire) {
        std::thread::yield_now();
    }
    args[0] as i32
}

fn join_detach_process(_: &[u8]) -> i32 {
    let tids: Vec<Tid> = (0..10u8)
        .map(|i| sys_create_thread(gated_worker, &[i]).unwrap())
        .collect();

    // Detach the odd ones while they are alive, then let everyone run.
    for (i, &tid) in tids.iter().enumerate() {
        if i % 2 == 1 {
            sys_thread_detach(tid).unwrap();
        }
    }
    WORKERS_RELEASED.store(true, Ordering::Release);

    // Joined evens return their index; joining a detached odd fails.
    for (i, &tid) in tids.iter().enumerate() {
        if i % 2 == 0 {
            assert_eq!(sys_thread_join(tid).unwrap(), i as i32);
        } else {
            assert_eq!(sys_thread_join(tid).unwrap_err().error(), Errno::EINVAL);
        }
    }
    0
}

fn join_detach_main(_: &[u8]) -> i32 {
    // Run the dance in a child process; reaping it proves the process
    // zombified once its thread count reached zero.
    let child = sys_exec(join_detach_process, &[]).unwrap();
    let (reaped, status) = sys_wait_child(Some(child)).unwrap();
    assert_eq!(reaped, child);
    status
}

#[test]
fn join_evens_detach_odds() {
    init_logger();
    assert_eq!(boot(join_detach_main, &[]), 0);
}

fn join_errors_main(_: &[u8]) -> i32 {
    // Joining yourself deadlocks, so it is refused.
    let myself = sys_thread_self();
    assert_eq!(sys_thread_join(myself).unwrap_err().error(), Errno::EDEADLK);

    // A tid from nowhere names no thread of this process.
    assert_eq!(sys_thread_join(myself + 999).unwrap_err().error(), Errno::ESRCH);
    assert_eq!(
        sys_thread_detach(myself + 999).unwrap_err().error(),
        Errno::ESRCH
    );
    0
}

#[test]
fn join_rejects_self_and_strangers() {
    init_logger();
    assert_eq!(boot(join_errors_main, &[]), 0);
}

static DETACH_GATE: AtomicBool = AtomicBool::new(false);

fn lingering_worker(_: &[u8]) -> i32 {
    while !DETACH_GATE.load(Ordering::Acquire) {
        std::thread::yield_now();
    }
    5
}

fn detacher(args: &[u8]) -> i32 {
    let target = Tid::from_le_bytes(args.try_into().unwrap());
    std::thread::sleep(core::time::Duration::from_millis(50));
    sys_thread_detach(target).unwrap();
    DETACH_GATE.store(true, Ordering::Release);
    0
}

fn detach_while_joining_main(_: &[u8]) -> i32 {
    let worker = sys_create_thread(lingering_worker, &[]).unwrap();
    let helper = sys_create_thread(detacher, &worker.to_le_bytes()).unwrap();

    // Block joining the worker; the helper detaches it under us, which
    // must wake us with an error instead of an exit value.
    assert_eq!(sys_thread_join(worker).unwrap_err().error(), Errno::EINVAL);

    assert_eq!(sys_thread_join(helper).unwrap(), 0);
    0
}

#[test]
fn detach_interrupts_a_blocked_join() {
    init_logger();
    assert_eq!(boot(detach_while_joining_main, &[]), 0);
}

fn double_join_worker(_: &[u8]) -> i32 {
    21
}

fn second_joiner(args: &[u8]) -> i32 {
    let target = Tid::from_le_bytes(args.try_into().unwrap());
    match sys_thread_join(target) {
        // Either we joined too and got the value, or the record was
        // already collected by the first joiner.
        Ok(21) => 0,
        Err(e) if e.error() == Errno::ESRCH => 0,
        other => panic!("unexpected join outcome: {:?}", other),
    }
}

fn exited_join_main(_: &[u8]) -> i32 {
    // Joining a thread that already exited still returns its value.
    let worker = sys_create_thread(double_join_worker, &[]).unwrap();
    std::thread::sleep(core::time::Duration::from_millis(50));
    assert_eq!(sys_thread_join(worker).unwrap(), 21);

    // The record is gone once its value was collected.
    assert_eq!(sys_thread_join(worker).unwrap_err().error(), Errno::ESRCH);
    // Detaching an exited (or collected) thread is an error as well.
    let worker = sys_create_thread(double_join_worker, &[]).unwrap();
    std::thread::sleep(core::time::Duration::from_millis(50));
    assert_eq!(sys_thread_detach(worker).unwrap_err().error(), Errno::EINVAL);
    assert_eq!(sys_thread_join(worker).unwrap(), 21);

    let worker = sys_create_thread(double_join_worker, &[]).unwrap();
    let other = sys_create_thread(second_joiner, &worker.to_le_bytes()).unwrap();
    assert!(matches!(sys_thread_join(worker), Ok(21) | Err(_)));
    assert_eq!(sys_thread_join(other).unwrap(), 0);
    0
}

#[test]
fn exit_values_survive_until_joined() {
    init_logger();
    assert_eq!(boot(exited_join_main, &[]), 0);
}
