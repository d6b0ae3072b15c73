// SPDX-License-Identifier: MPL-2.0

#![allow(dead_code)]

/// Error number.
///
/// The subset of the classic errno space this kernel can actually produce.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Errno {
    ESRCH = 3,         /* No such process */
    EBADF = 9,         /* Bad file number */
    ECHILD = 10,       /* No child processes */
    EAGAIN = 11,       /* Try again */
    EINVAL = 22,       /* Invalid argument */
    EMFILE = 24,       /* Too many open files */
    EPIPE = 32,        /* Broken pipe */
    EDEADLK = 35,      /* Resource deadlock would occur */
    ENOTSOCK = 88,     /* Socket operation on non-socket */
    EADDRINUSE = 98,   /* Address already in use */
    ECONNABORTED = 103, /* Software caused connection abort */
    EISCONN = 106,     /* Transport endpoint is already connected */
    ENOTCONN = 107,    /* Transport endpoint is not connected */
    ETIMEDOUT = 110,   /* Connection timed out */
    ECONNREFUSED = 111, /* Connection refused */
}

/// Error used in this crate.
#[derive(Debug, Clone, Copy)]
pub struct Error {
    errno: Errno,
    msg: Option<&'static str>,
}

impl Error {
    pub const fn new(errno: Errno) -> Self {
        Error { errno, msg: None }
    }

    pub const fn with_message(errno: Errno, msg: &'static str) -> Self {
        Error {
            errno,
            msg: Some(msg),
        }
    }

    pub const fn error(&self) -> Errno {
        self.errno
    }

    pub const fn message(&self) -> Option<&'static str> {
        self.msg
    }
}

impl From<Errno> for Error {
    fn from(errno: Errno) -> Self {
        Error::new(errno)
    }
}

impl AsRef<Error> for Error {
    fn as_ref(&self) -> &Error {
        self
    }
}

#[macro_export]
macro_rules! return_errno {
    ($errno: expr) => {
        return Err($crate::error::Error::new($errno))
    };
}

#[macro_export]
macro_rules! return_errno_with_message {
    ($errno: expr, $message: expr) => {
        return Err($crate::error::Error::with_message($errno, $message))
    };
}
