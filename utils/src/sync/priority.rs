use super::semaphore::Semaphore;
use event_listener::Event;
use std::{
    cell::UnsafeCell,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicUsize, Ordering},
};

/// A two-tier reader-writer lock. High-priority readers and writers contend for the data with
/// the usual shared-read/exclusive-write semantics, while low-priority writers are queued behind
/// every high-priority client which is already waiting. A low-priority writer only attempts to
/// capture the data once no high-priority client is pending, and low-priority writers are
/// serialized among themselves.
///
/// Built on the same non-fair [`Semaphore`] as the readers-first lock: readers acquire a single
/// permit and writers acquire all permits.
pub struct PriorityRwLock<T> {
    data_sem: Semaphore,
    low_priority_sem: Semaphore,
    pending_high: AtomicUsize,
    high_drained: Event,
    data: UnsafeCell<T>,
}

// Access to `data` is mediated by the semaphore permits held by the guards
unsafe impl<T: Send> Send for PriorityRwLock<T> {}
unsafe impl<T: Send + Sync> Sync for PriorityRwLock<T> {}

impl<T: Default> Default for PriorityRwLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> PriorityRwLock<T> {
    pub fn new(data: T) -> Self {
        Self {
            data_sem: Semaphore::new(Semaphore::MAX_PERMITS),
            low_priority_sem: Semaphore::new(1),
            pending_high: AtomicUsize::new(0),
            high_drained: Event::new(),
            data: UnsafeCell::new(data),
        }
    }

    pub fn high_priority_read(&self) -> PriorityReadGuard<'_, T> {
        self.acquire_high_priority(1);
        PriorityReadGuard { lock: self }
    }

    pub fn high_priority_write(&self) -> PriorityWriteGuard<'_, T> {
        self.acquire_high_priority(Semaphore::MAX_PERMITS);
        PriorityWriteGuard { lock: self, low_priority: false }
    }

    pub fn low_priority_write(&self) -> PriorityWriteGuard<'_, T> {
        self.low_priority_sem.blocking_acquire(1);
        loop {
            self.wait_for_high_priority_drain();
            // Register before checking so that a release in between is not missed
            let listener = self.data_sem.listen();
            if self.pending_high.load(Ordering::Acquire) != 0 {
                continue;
            }
            if self.data_sem.try_acquire(Semaphore::MAX_PERMITS).is_some() {
                return PriorityWriteGuard { lock: self, low_priority: true };
            }
            listener.wait();
        }
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    fn acquire_high_priority(&self, permits: usize) {
        self.pending_high.fetch_add(1, Ordering::AcqRel);
        self.data_sem.blocking_acquire(permits);
        if self.pending_high.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.high_drained.notify(usize::MAX);
        }
    }

    fn wait_for_high_priority_drain(&self) {
        while self.pending_high.load(Ordering::Acquire) != 0 {
            let listener = self.high_drained.listen();
            if self.pending_high.load(Ordering::Acquire) == 0 {
                break;
            }
            listener.wait();
        }
    }
}

pub struct PriorityReadGuard<'a, T> {
    lock: &'a PriorityRwLock<T>,
}

impl<T> Deref for PriorityReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for PriorityReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.data_sem.release(1);
    }
}

pub struct PriorityWriteGuard<'a, T> {
    lock: &'a PriorityRwLock<T>,
    low_priority: bool,
}

impl<T> Deref for PriorityWriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for PriorityWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for PriorityWriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.data_sem.release(Semaphore::MAX_PERMITS);
        if self.low_priority {
            self.lock.low_priority_sem.release(1);
        }
    }
}
