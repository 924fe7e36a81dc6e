//! Storage collaborator for strata.
//!
//! The diff engine never touches files or storage formats directly: it reads
//! a hierarchical store through the [`TreeStore`] trait. Nodes are addressed
//! by [`NodePath`](strata_types::NodePath); groups list their children,
//! every node carries attributes, and datasets carry a typed body.
//!
//! # Backends
//!
//! - [`InMemoryTree`] -- `BTreeMap`-based tree for tests, embedding and the CLI,
//!   loadable from / savable to a JSON [`TreeDocument`]
//!
//! # Design Rules
//!
//! 1. Stores are read-only from the engine's point of view.
//! 2. Every non-root node's parent exists and is a group.
//! 3. Children are listed in name order, so traversal is deterministic.
//! 4. All read errors are propagated, never silently ignored.

pub mod document;
pub mod error;
pub mod memory;
pub mod traits;
pub mod verify;

// Re-export primary types at crate root for ergonomic imports.
pub use document::{NodeDocument, TreeDocument};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryTree;
pub use traits::TreeStore;
pub use verify::{verify_readable, Verification};
