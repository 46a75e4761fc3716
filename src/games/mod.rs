//! Game implementations.

pub mod uno;
