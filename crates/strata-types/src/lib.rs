//! Foundation types for strata.
//!
//! This crate provides the data model shared by every other strata crate:
//! addresses of nodes inside a hierarchical store, the element types and
//! shapes of dataset bodies, and the typed values that carry them.
//!
//! # Key Types
//!
//! - [`NodePath`] -- Absolute, normalized, slash-separated node address
//! - [`NodeKind`] -- Group (container) or Dataset (leaf with a body)
//! - [`DType`] / [`DTypeClass`] -- Element type tag and its comparison category
//! - [`Shape`] -- Array dimensions (empty for scalars)
//! - [`Value`] / [`Data`] -- Typed, shaped body of a dataset or attribute
//! - [`Attributes`] -- Ordered name → value mapping attached to any node

pub mod dtype;
pub mod error;
pub mod node;
pub mod path;
pub mod value;

pub use dtype::{DType, DTypeClass};
pub use error::TypeError;
pub use node::{DatasetMeta, NodeKind};
pub use path::NodePath;
pub use value::{Attributes, Data, Shape, Value};
