//! In-memory job store.
//!
//! This crate provides:
//! - Job creation with arrival-ordered enqueueing
//! - Exclusive dequeue for workers
//! - Progress updates and re-enqueueing
//! - Queue position tracking for observers

pub mod error;
pub mod store;

pub use error::{QueueError, QueueResult};
pub use store::{JobStore, QueueStats, StoreConfig};
