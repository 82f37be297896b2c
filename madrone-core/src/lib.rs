//! Core types for the madrone ordered-container crates.
//!
//! This crate provides the fundamental types shared by the tree engines:
//! arena handles, node colors, and the comparison capability injected by
//! the caller.

#![cfg_attr(not(test), no_std)]

pub mod compare;
pub mod types;

pub use compare::{Comparator, NaturalOrder};
pub use types::{Color, NodeId};

#[cfg(test)]
mod tests {
    #[test]
    fn test_reexports() {
        let _ = super::Color::Red;
        let _ = super::NaturalOrder;
    }
}
