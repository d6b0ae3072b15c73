// SPDX-License-Identifier: MPL-2.0

#![allow(unused)]

pub(crate) use std::{
    boxed::Box,
    collections::VecDeque,
    string::{String, ToString},
    sync::{Arc, Weak},
    vec,
    vec::Vec,
};

pub(crate) use core::{fmt::Debug, time::Duration};

pub(crate) use lazy_static::lazy_static;
pub(crate) use log::{debug, error, info, trace, warn};
pub(crate) use spin::{Mutex, MutexGuard, RwLock};

/// Returns the current process.
#[macro_export]
macro_rules! current {
    () => {
        $crate::process::current()
    };
}

/// Returns the current thread.
#[macro_export]
macro_rules! current_thread {
    () => {
        $crate::thread::current()
    };
}

pub(crate) use crate::{
    current, current_thread,
    error::{Errno, Error},
    return_errno, return_errno_with_message,
};

pub(crate) type Result<T> = core::result::Result<T, Error>;
