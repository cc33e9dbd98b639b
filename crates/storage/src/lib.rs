//! In-memory reference `Queue` implementation.
//!
//! This crate provides [`MemoryQueue`], a mutex-guarded, in-process
//! implementation of `tcc_durability::Queue`, the way the teacher ships an
//! in-memory reference store (`ShardedStore`) alongside its durable disk
//! path. Every integration test and the demo CLI run against it;
//! production callers bring their own `Queue` backed by a real database.

mod memory_queue;

pub use memory_queue::MemoryQueue;
