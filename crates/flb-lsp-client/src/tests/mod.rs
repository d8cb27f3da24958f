//! Crate-level tests that need the recording doubles.

mod support;
