//! Pure domain types, traits and helpers for the contact aggregate layer.
//!
//! Nothing in this crate performs I/O. Concrete relational and cache backends
//! live in the `contactstore` crate.

pub mod cache;
pub mod clock;
pub mod contact;
pub mod storage;
