//! Redis-backed task queue: at-least-once delivery of submitted
//! tasks to the worker, progress visibility, and retry/failure signaling.

pub mod config;
pub mod error;
pub mod queue;

pub use config::QueueConfig;
pub use error::QueueError;
pub use queue::{ClaimedTicket, RedisQueue};
