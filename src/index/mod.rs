//! Property Indexing module
//!
//! Provides B-Tree indices over (label, property) for equality lookups.

pub mod property_index;
pub mod manager;

pub use property_index::{IndexKey, PropertyIndex};
pub use manager::{IndexManager, PropertyIndexKey};
