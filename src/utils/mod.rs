//! # Utility Modules
//!
//! Supporting utilities shared across the codec.
//!
//! ## Components
//! - **Buffer Pool**: reusable output buffers for the very common case of
//!   many small encoded messages

pub mod buffer_pool;

pub use buffer_pool::{BufferPool, PooledBuffer};
