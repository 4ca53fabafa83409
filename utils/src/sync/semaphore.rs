use event_listener::{Event, EventListener};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A low-level non-fair semaphore. The semaphore is non-fair in the sense that clients acquiring
/// a lower number of permits might get their allocation before earlier clients which requested more
/// permits -- if the semaphore can provide the lower allocation but not the larger. Additionally it
/// is possible that a new client immediately acquires if it happens to arrive right after a release
/// and before others were awaked.
#[derive(Debug)]
pub(crate) struct Semaphore {
    counter: AtomicUsize,
    signal: Event,
}

impl Semaphore {
    pub const MAX_PERMITS: usize = usize::MAX;

    pub fn new(available_permits: usize) -> Semaphore {
        Semaphore { counter: AtomicUsize::new(available_permits), signal: Event::new() }
    }

    /// Tries to acquire `permits` slots from the semaphore. Upon success, returns the acquired slot
    pub fn try_acquire(&self, permits: usize) -> Option<usize> {
        let mut count = self.counter.load(Ordering::Acquire);
        loop {
            if count < permits {
                return None;
            }

            match self.counter.compare_exchange_weak(count, count - permits, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return Some(count),
                Err(c) => count = c,
            }
        }
    }

    /// Synchronously waits for `permits` permits to be acquired. Returns the acquired slot
    pub fn blocking_acquire(&self, permits: usize) -> usize {
        let mut listener = None;

        loop {
            if let Some(slot) = self.try_acquire(permits) {
                return slot;
            }

            match listener.take() {
                None => listener = Some(self.signal.listen()),
                Some(l) => l.wait(),
            }
        }
    }

    /// Registers for the next release. Callers must re-check their acquire condition after
    /// registering and before waiting, otherwise a release may be missed
    pub fn listen(&self) -> EventListener {
        self.signal.listen()
    }

    /// Releases a number of `permits` previously acquired by a call to [`Self::try_acquire`] or
    /// [`Self::blocking_acquire`]. Returns the released slot
    pub fn release(&self, permits: usize) -> usize {
        let slot = self.counter.fetch_add(permits, Ordering::AcqRel) + permits;
        // Waiters ask for different permit counts, so all of them must get a chance to re-check
        self.signal.notify(usize::MAX);
        slot
    }
}
