//! Integration test suite for ferno.
//!
//! These tests exercise the orchestrator end to end: ordering guarantees,
//! concurrency bounding, fail-fast propagation, streaming, and progress
//! accounting. They verify that all components work together correctly.
//!
//! # Test Categories
//!
//! - `ordering`: result-shape guarantees for `all` and `props`
//! - `concurrency`: ceiling enforcement and serialization
//! - `failure`: fail-fast, identity tagging, and cancellation
//! - `streaming`: `generate` completion order and abandonment
//! - `progress_reporting`: advance accounting under load
//!
//! # CI Compatibility
//!
//! Tasks are artificial sleeps and counters; no network or disk is
//! touched. Timing assertions use generous margins.

mod fixtures;

mod concurrency;
mod progress_reporting;
