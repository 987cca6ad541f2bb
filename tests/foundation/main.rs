//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Value, generational ids, Error, and persistent lists.

mod errors;
