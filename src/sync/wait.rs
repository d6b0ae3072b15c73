// SPDX-License-Identifier: MPL-2.0

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::{
    thread,
    time::{Duration, Instant},
};

use crate::prelude::*;

/// A wait queue.
///
/// One may wait on a wait queue to put its executing thread to sleep.
/// Multiple threads may be the waiters of a wait queue. Other threads may
/// invoke the `wake`-family methods of a wait queue to wake up one or many
/// waiter threads.
pub struct WaitQueue {
    // A copy of `wakers.len()`, used for the lock-free fast path in
    // `wake_one` and `wake_all`.
    num_wakers: AtomicU32,
    wakers: Mutex<VecDeque<Arc<Waker>>>,
}

impl WaitQueue {
    pub const fn new() -> Self {
        WaitQueue {
            num_wakers: AtomicU32::new(0),
            wakers: Mutex::new(VecDeque::new()),
        }
    }

    /// Waits until some condition is met.
    ///
    /// This method takes a closure that tests a user-given condition and
    /// only returns once the closure returns `Some(_)`. A waker thread
    /// should first make the condition `Some(_)`, then invoke a
    /// `wake`-family method; the waker is enqueued *before* the condition
    /// is re-tested here, so that ordering guarantees no wakeup is lost.
    pub fn wait_until<F, R>(&self, mut cond: F) -> R
    where
        F: FnMut() -> Option<R>,
    {
        if let Some(res) = cond() {
            return res;
        }

        let waiter = Waiter::new();
        loop {
            self.enqueue(waiter.waker());

            if let Some(res) = cond() {
                return res;
            }

            waiter.wait();
        }
    }

    /// Waits until some condition is met or the timeout expires.
    ///
    /// A timeout of `None` means an infinite wait. Expiry surfaces as
    /// [`Errno::ETIMEDOUT`]; the condition is tested one final time first,
    /// so a wakeup racing the deadline is not reported as a timeout.
    pub fn wait_until_or_timeout<F, R>(&self, mut cond: F, timeout: Option<Duration>) -> Result<R>
    where
        F: FnMut() -> Option<R>,
    {
        let Some(timeout) = timeout else {
            return Ok(self.wait_until(cond));
        };

        if let Some(res) = cond() {
            return Ok(res);
        }

        let deadline = Instant::now() + timeout;
        let waiter = Waiter::new();
        loop {
            self.enqueue(waiter.waker());

            if let Some(res) = cond() {
                return Ok(res);
            }

            if !waiter.wait_until(deadline) {
                if let Some(res) = cond() {
                    return Ok(res);
                }
                return_errno_with_message!(Errno::ETIMEDOUT, "the wait timed out");
            }
        }
    }

    /// Wakes up one waiting thread.
    pub fn wake_one(&self) {
        // Fast path
        if self.is_empty() {
            return;
        }

        loop {
            let mut wakers = self.wakers.lock();
            let Some(waker) = wakers.pop_front() else {
                break;
            };
            self.num_wakers.fetch_sub(1, Ordering::Release);
            // Avoid holding the lock when calling `wake_up`
            drop(wakers);

            if waker.wake_up() {
                return;
            }
        }
    }

    /// Wakes up all waiting threads.
    pub fn wake_all(&self) {
        // Fast path
        if self.is_empty() {
            return;
        }

        loop {
            let mut wakers = self.wakers.lock();
            let Some(waker) = wakers.pop_front() else {
                break;
            };
            self.num_wakers.fetch_sub(1, Ordering::Release);
            drop(wakers);

            waker.wake_up();
        }
    }

    /// Returns whether the wait queue currently has no enqueued waker.
    pub fn is_empty(&self) -> bool {
        self.num_wakers.load(Ordering::Acquire) == 0
    }

    fn enqueue(&self, waker: Arc<Waker>) {
        let mut wakers = self.wakers.lock();
        wakers.push_back(waker);
        self.num_wakers.fetch_add(1, Ordering::Release);
    }
}

impl Default for WaitQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// A waiter that can put the current thread to sleep until it is woken up
/// by the associated [`Waker`].
///
/// A waiter belongs to the thread that created it and must not be handed
/// to another thread.
pub struct Waiter {
    waker: Arc<Waker>,
}

/// A waker that can wake up the associated [`Waiter`] from any thread.
pub struct Waker {
    has_woken: AtomicBool,
    host: thread::Thread,
}

impl Waiter {
    pub fn new() -> Self {
        Self {
            waker: Arc::new(Waker {
                has_woken: AtomicBool::new(false),
                host: thread::current(),
            }),
        }
    }

    /// Waits until the waiter is woken by [`Waker::wake_up`].
    ///
    /// Returns immediately if the waiter has been woken since the last
    /// call; otherwise the current thread sleeps.
    pub fn wait(&self) {
        while !self.waker.has_woken.load(Ordering::Acquire) {
            thread::park();
        }
        self.waker.has_woken.store(false, Ordering::Release);
    }

    /// Waits like [`wait`], but gives up at `deadline`.
    ///
    /// Returns `true` if woken, `false` on deadline expiry.
    ///
    /// [`wait`]: Self::wait
    pub fn wait_until(&self, deadline: Instant) -> bool {
        loop {
            if self.waker.has_woken.load(Ordering::Acquire) {
                self.waker.has_woken.store(false, Ordering::Release);
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::park_timeout(deadline - now);
        }
    }

    /// Gets the associated [`Waker`] of this waiter.
    pub fn waker(&self) -> Arc<Waker> {
        self.waker.clone()
    }
}

impl Default for Waiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        // Close the waker so that a later wake_up on a stale queue entry
        // becomes a no-op instead of unparking an unrelated sleep.
        self.waker.close();
    }
}

impl Waker {
    /// Wakes up the associated [`Waiter`].
    ///
    /// Returns `true` if the waiter is woken by this call, `false` if it
    /// was already woken by a previous call or has been dropped.
    pub fn wake_up(&self) -> bool {
        if self.has_woken.swap(true, Ordering::AcqRel) {
            return false;
        }

        self.host.unpark();
        true
    }

    fn close(&self) {
        self.has_woken.store(true, Ordering::Release);
    }
}
