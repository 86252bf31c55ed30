//! Data module - Dataset loading and aggregation

mod aggregate;
mod model;
mod source;
mod store;
#[cfg(test)]
pub mod testing;

pub use aggregate::EntityRef;
pub use model::{Coordinates, Dataset};
pub use source::{source_for, FileSource};
pub use store::{DataStore, SharedLoad};
