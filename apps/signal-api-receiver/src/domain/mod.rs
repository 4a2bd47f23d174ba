//! Domain Layer - Message schema, filtering and buffering.
//!
//! This layer contains the core types for the receiver with no transport
//! dependencies. All types here are pure Rust with serialization support.

/// Signal envelope and message wire types.
pub mod message;

/// Accept policy deciding which envelopes are buffered.
pub mod filter;

/// FIFO buffer of accepted messages.
pub mod queue;
