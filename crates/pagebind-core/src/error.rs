use crate::{
    collection::{CollectionError, ServiceError},
    config::ConfigError,
    member::MemberError,
    path::{EvalError, EvalErrorKind, ParseError},
    query::QueryError,
    selection::SelectionError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Top-level error aggregating every layer. `class()` gives a stable
/// coarse classification for callers that branch on failure kind.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Member(#[from] MemberError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Parse(_) => ErrorClass::Parse,
            Self::Eval(err) => eval_class(err),
            Self::Member(_) => ErrorClass::Resolution,
            Self::Query(err) => query_class(err),
            Self::Collection(err) => collection_class(err),
            Self::Selection(_) => ErrorClass::Caller,
            Self::Service(_) => ErrorClass::Service,
            Self::Config(_) => ErrorClass::Configuration,
        }
    }
}

const fn eval_class(err: &EvalError) -> ErrorClass {
    match err.kind {
        EvalErrorKind::NullNavigation => ErrorClass::NullNavigation,
        EvalErrorKind::NotAssignable { .. } => ErrorClass::Caller,
        EvalErrorKind::MemberNotFound { .. }
        | EvalErrorKind::MethodNotFound { .. }
        | EvalErrorKind::VariableNotFound { .. }
        | EvalErrorKind::Member(_) => ErrorClass::Resolution,
    }
}

const fn query_class(err: &QueryError) -> ErrorClass {
    match err {
        QueryError::Path(err) => eval_class(err),
        QueryError::Parse(_) => ErrorClass::Parse,
        _ => ErrorClass::Configuration,
    }
}

const fn collection_class(err: &CollectionError) -> ErrorClass {
    match err {
        CollectionError::Query(err) => query_class(err),
        CollectionError::Service(_) => ErrorClass::Service,
        CollectionError::InvalidPageIdx { .. }
        | CollectionError::InvalidPageSize
        | CollectionError::ForeignItem
        | CollectionError::Selection(_) => ErrorClass::Caller,
    }
}

///
/// ErrorClass
/// Coarse error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Parse,
    Resolution,
    NullNavigation,
    Configuration,
    Caller,
    Service,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Parse => "parse",
            Self::Resolution => "resolution",
            Self::NullNavigation => "null_navigation",
            Self::Configuration => "configuration",
            Self::Caller => "caller",
            Self::Service => "service",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::SyntaxVersion,
        path::{PathEvaluator, PathExpr},
        test_fixtures::Person,
    };

    #[test]
    fn layers_map_to_classes() {
        let parse = PathExpr::parse("name(", SyntaxVersion::V2).expect_err("unclosed call");
        assert_eq!(Error::from(parse).class(), ErrorClass::Parse);

        let eval = PathEvaluator::new(Default::default());
        let expr = eval.parse("address.city").expect("path should parse");
        let err = eval
            .evaluate(&expr, &Person::new(1, "a", 1))
            .expect_err("address is null");
        let err = Error::from(CollectionError::from(QueryError::from(err)));
        assert_eq!(err.class(), ErrorClass::NullNavigation);
        assert_eq!(err.class().to_string(), "null_navigation");

        let err = Error::from(QueryError::EmptyJunction { junction: "AND" });
        assert_eq!(err.class(), ErrorClass::Configuration);

        let err = Error::from(CollectionError::InvalidPageIdx { idx: 0 });
        assert_eq!(err.class(), ErrorClass::Caller);

        let err = Error::from(ServiceError::new("down"));
        assert_eq!(err.class(), ErrorClass::Service);
        assert_eq!(err.to_string(), "query service failed: down");
    }
}
