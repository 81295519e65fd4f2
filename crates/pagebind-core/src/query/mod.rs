//! Query model (attributes, operators, filters, sort orders, options and
//! params) and the in-memory evaluator that interprets it.

mod attr;
mod eval;
mod filter;
mod op;
mod options;
mod params;
mod sort;

use crate::{
    path::{EvalError, ParseError},
    value::ValueType,
};
use thiserror::Error as ThisError;

// re-exports
pub use attr::{CompositeAttr, PathAttr, QueryAttr};
pub use eval::{CompareEvaluator, InMemQueryEvaluator};
pub use filter::{FilterCompare, FilterExpr};
pub use op::{CompOp, CompOpKind};
pub use options::{FilterDef, QueryOptions};
pub use params::QueryParams;
pub use sort::{Comparator, SortDirection, SortKey, SortOrder, natural_cmp};

///
/// QueryError
///
/// Configuration and evaluation failures of the query layer. All of them
/// are caller errors and propagate; none degrade to a default result.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum QueryError {
    #[error("{junction} requires at least one child expression")]
    EmptyJunction { junction: &'static str },

    #[error("IN on '{attr}' requires a list operand, found {found:?}")]
    InOperandNotCollection { attr: String, found: ValueType },

    #[error("cannot order {left:?} against {right:?} for '{attr}'")]
    Incomparable {
        attr: String,
        left: ValueType,
        right: ValueType,
    },

    #[error("{op} on '{attr}' requires a text operand, found {found:?}")]
    TextOperand {
        attr: String,
        op: CompOpKind,
        found: ValueType,
    },

    #[error("no evaluator registered for operator {op}")]
    NoEvaluator { op: CompOpKind },

    #[error("invalid LIKE pattern '{pattern}': {reason}")]
    InvalidLikePattern { pattern: String, reason: String },

    #[error("filtering by '{attr}' is not allowed")]
    FilterNotAllowed { attr: String },

    #[error("operator {op} is not allowed on '{attr}'")]
    OperatorNotAllowed { attr: String, op: CompOpKind },

    #[error("sorting by '{attr}' is not allowed")]
    SortNotAllowed { attr: String },

    #[error("literal for '{attr}' must be {expected:?}, found {found:?}")]
    LiteralType {
        attr: String,
        expected: ValueType,
        found: ValueType,
    },

    #[error("{0}")]
    Custom(String),

    #[error(transparent)]
    Path(#[from] EvalError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
