//! Core runtime for pagebind: path expressions, the query model with its
//! in-memory evaluator, pageable collections, selection tracking and the
//! query-service page cache.

// Lets `#[derive(Members)]` output (which names `::pagebind`) expand inside
// this crate's own tests.
extern crate self as pagebind;

pub mod collection;
pub mod config;
pub mod error;
pub mod member;
pub mod obs;
pub mod path;
pub mod query;
pub mod selection;
pub mod traits;
pub mod value;

#[cfg(test)]
pub(crate) mod test_fixtures;

// re-exports
pub use error::{Error, ErrorClass};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        collection::{
            InMemCollection, PageableCollection, QueryService, QueryServiceCollection,
        },
        config::{CollectionConfig, Config, EvalConfig, SyntaxVersion},
        error::{Error, ErrorClass},
        path::{PathEvaluator, PathExpr},
        query::{
            CompOp, CompOpKind, FilterExpr, InMemQueryEvaluator, QueryAttr, QueryOptions,
            QueryParams, SortDirection, SortOrder,
        },
        selection::{SelectMode, Selection, SelectionHandler},
        traits::{FieldValue, Object},
        value::Value,
    };
}
