// SPDX-License-Identifier: MPL-2.0

//! Pipe scenarios driven through boot and the system-call surface.

use mikros::*;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ascending(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

const ECHO_LEN: usize = 5000;

fn echo_writer(args: &[u8]) -> i32 {
    let wfid = args[0] as Fid;
    let data = ascending(ECHO_LEN);
    assert_eq!(sys_write(wfid, &data).unwrap(), ECHO_LEN);
    sys_close(wfid).unwrap();
    0
}

fn pipe_echo_main(_: &[u8]) -> i32 {
    let fds = sys_pipe().unwrap();

    // The stream is longer than the pipe buffer, so the writer must block
    // until this thread drains; run it as a second thread of the process.
    let writer = sys_create_thread(echo_writer, &[fds.write as u8]).unwrap();

    let mut received = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = sys_read(fds.read, &mut buf).unwrap();
        if n == 0 {
            break;
        }
        received.extend_from_slice(&buf[..n]);
    }

    assert_eq!(sys_thread_join(writer).unwrap(), 0);
    assert_eq!(received, ascending(ECHO_LEN));
    // End of stream is sticky.
    assert_eq!(sys_read(fds.read, &mut buf).unwrap(), 0);
    sys_close(fds.read).unwrap();
    0
}

#[test]
fn pipe_echo() {
    init_logger();
    assert_eq!(boot(pipe_echo_main, &[]), 0);
}

fn trap_ops_main(_: &[u8]) -> i32 {
    let fds = sys_pipe().unwrap();
    let mut buf = [0u8; 4];

    // The not-applicable operations of each end are wired to traps.
    assert_eq!(sys_read(fds.write, &mut buf).unwrap_err().error(), Errno::EBADF);
    assert_eq!(sys_write(fds.read, b"x").unwrap_err().error(), Errno::EBADF);

    // Zero-length transfers are invalid arguments.
    assert_eq!(sys_write(fds.write, &[]).unwrap_err().error(), Errno::EINVAL);
    assert_eq!(sys_read(fds.read, &mut []).unwrap_err().error(), Errno::EINVAL);

    // A closed fid no longer dispatches.
    sys_close(fds.read).unwrap();
    assert_eq!(sys_read(fds.read, &mut buf).unwrap_err().error(), Errno::EBADF);
    // ...and the writer observes the broken pipe.
    assert_eq!(sys_write(fds.write, b"x").unwrap_err().error(), Errno::EPIPE);
    0
}

#[test]
fn pipe_trap_operations() {
    init_logger();
    assert_eq!(boot(trap_ops_main, &[]), 0);
}

fn dup2_main(_: &[u8]) -> i32 {
    let fds = sys_pipe().unwrap();
    sys_write(fds.write, b"shared").unwrap();

    // Duplicate the read end, close the original; the record survives.
    let dup = sys_dup2(fds.read, 7).unwrap();
    sys_close(fds.read).unwrap();

    let mut buf = [0u8; 16];
    assert_eq!(sys_read(dup, &mut buf).unwrap(), 6);
    assert_eq!(&buf[..6], b"shared");

    // Closing the last read fid is the real close: the writer sees it.
    sys_close(dup).unwrap();
    assert_eq!(sys_write(fds.write, b"x").unwrap_err().error(), Errno::EPIPE);
    0
}

#[test]
fn dup2_shares_the_open_stream() {
    init_logger();
    assert_eq!(boot(dup2_main, &[]), 0);
}

fn inherit_writer(args: &[u8]) -> i32 {
    let wfid = args[0] as Fid;
    sys_write(wfid, b"from child").unwrap();
    sys_close(wfid).unwrap();
    0
}

fn inherit_main(_: &[u8]) -> i32 {
    let fds = sys_pipe().unwrap();
    let child = sys_exec(inherit_writer, &[fds.write as u8]).unwrap();

    // Drop our copy of the write end; the child's inherited record keeps
    // the end open until the child closes (or exits).
    sys_close(fds.write).unwrap();

    let mut received = Vec::new();
    let mut buf = [0u8; 8];
    loop {
        let n = sys_read(fds.read, &mut buf).unwrap();
        if n == 0 {
            break;
        }
        received.extend_from_slice(&buf[..n]);
    }
    assert_eq!(received, b"from child");

    let (reaped, status) = sys_wait_child(Some(child)).unwrap();
    assert_eq!(reaped, child);
    status
}

#[test]
fn descriptors_are_inherited_on_exec() {
    init_logger();
    assert_eq!(boot(inherit_main, &[]), 0);
}
