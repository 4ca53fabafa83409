pub mod priority;
pub(crate) mod semaphore;
