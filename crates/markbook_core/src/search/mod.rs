//! Public, read-only result lookup entry points.
//!
//! # Responsibility
//! - Expose the only query surface reachable by unauthenticated callers.
//! - Keep unpublished data invisible to that surface.

pub mod public_results;
