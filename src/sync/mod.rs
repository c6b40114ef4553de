//! # Primitivas de Coordinación
//! src/sync/mod.rs
//!
//! - `rwlock`: lock lector/escritor con equidad N-way para un recurso
//! - `registry`: registro `URI -> lock`, creado bajo demanda
//! - `queue`: cola acotada dispatcher → workers

pub mod queue;
pub mod registry;
pub mod rwlock;

pub use queue::{BoundedQueue, QueueClosed};
pub use registry::{LockHandle, LockRegistry};
pub use rwlock::{FairRwLock, LockStats, ReadGuard, WriteGuard};
