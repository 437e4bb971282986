//! Property-based tests for resolution and rendering

mod rendering;
