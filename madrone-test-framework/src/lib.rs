//! Test framework for the madrone container crates.
//!
//! This crate provides acceptance-test infrastructure for the tree engine.
//! It drives the public API only, the way an embedding application would,
//! with the engine's `verify` feature enabled so every mutation re-checks
//! the structural invariants.

pub mod helpers;
