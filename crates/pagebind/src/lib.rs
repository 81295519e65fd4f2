//! ## Crate layout
//! - `core`: runtime values, path expressions, query model, in-memory
//!   evaluation, pageable collections, selection and observability.
//! - `Members`: derive macro that generates the accessor tables path
//!   expressions resolve against.
//!
//! The `prelude` module carries the surface most callers need.

pub use pagebind_core as core;
pub use pagebind_derive::Members;

// derive output names `::pagebind::{member, traits, value}`
pub use pagebind_core::{
    Error, ErrorClass, collection, config, error, member, obs, path, query, selection, traits,
    value,
};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::Members;
    pub use pagebind_core::prelude::*;
}
