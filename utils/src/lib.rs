pub mod mem_size;
pub mod sync;
