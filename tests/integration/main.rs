//! # Integration Tests
//!
//! End-to-end prediction scenarios driving the public library surface.
