mod compare;
mod like;


use crate::{
    config::EvalConfig,
    obs::sink::{self, MetricsEvent},
    path::PathEvaluator,
    query::{CompOpKind, FilterCompare, FilterExpr, QueryAttr, QueryError, SortOrder},
    traits::Object,
    value::{CompositeValue, Value},
};
use std::{collections::BTreeMap, fmt, sync::Arc};

use like::LikeCache;

///
/// CompareEvaluator
///
/// Handler for one comparison kind. Registered handlers take precedence
/// over the builtin semantics, and are the only way to evaluate
/// `CompOpKind::Custom` operators.
///

pub trait CompareEvaluator: Send + Sync {
    fn evaluate(&self, compare: &FilterCompare, actual: &Value) -> Result<bool, QueryError>;
}

impl<F> CompareEvaluator for F
where
    F: Fn(&FilterCompare, &Value) -> Result<bool, QueryError> + Send + Sync,
{
    fn evaluate(&self, compare: &FilterCompare, actual: &Value) -> Result<bool, QueryError> {
        self(compare, actual)
    }
}

///
/// EvalRun
///
/// State scoped to one filter run: compiled LIKE patterns and row counts.
///

#[derive(Default)]
struct EvalRun {
    like: LikeCache,
    scanned: u64,
    matched: u64,
}

///
/// InMemQueryEvaluator
///
/// Interprets filter expressions and sort orders against in-memory items.
/// Attribute values come from the path evaluator; each filter kind is
/// handled by a fixed match arm, and each comparison kind by a registered
/// handler or the builtin semantics.
///

#[derive(Clone)]
pub struct InMemQueryEvaluator {
    paths: PathEvaluator,
    handlers: BTreeMap<CompOpKind, Arc<dyn CompareEvaluator>>,
}

impl InMemQueryEvaluator {
    #[must_use]
    pub fn new(config: EvalConfig) -> Self {
        Self::with_paths(PathEvaluator::new(config))
    }

    #[must_use]
    pub fn with_paths(paths: PathEvaluator) -> Self {
        Self {
            paths,
            handlers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn paths(&self) -> &PathEvaluator {
        &self.paths
    }

    /// Register (or replace) the handler for one comparison kind.
    pub fn register(&mut self, kind: CompOpKind, handler: impl CompareEvaluator + 'static) {
        self.handlers.insert(kind, Arc::new(handler));
    }

    #[must_use]
    pub fn with_handler(
        mut self,
        kind: CompOpKind,
        handler: impl CompareEvaluator + 'static,
    ) -> Self {
        self.register(kind, handler);
        self
    }

    /// Value of `attr` on `item`. Composite attributes yield a composite
    /// value with one part per declared part attribute.
    pub fn attr_value(&self, item: &dyn Object, attr: &QueryAttr) -> Result<Value, QueryError> {
        match attr {
            QueryAttr::Path(path) => Ok(self.paths.evaluate(path.path(), item)?),
            QueryAttr::Composite(composite) => {
                let mut value = CompositeValue::new();
                for part in composite.parts() {
                    value.push(part.name(), self.paths.evaluate(part.path(), item)?);
                }

                Ok(Value::Composite(value))
            }
        }
    }

    /// Whether `item` matches `filter`.
    pub fn evaluate(&self, item: &dyn Object, filter: &FilterExpr) -> Result<bool, QueryError> {
        self.eval_expr(item, filter, &mut EvalRun::default())
    }

    /// Items matching `filter`, in input order. `None` matches everything.
    pub fn evaluate_subset<'i, T: Object>(
        &self,
        items: impl IntoIterator<Item = &'i T>,
        filter: Option<&FilterExpr>,
    ) -> Result<Vec<&'i T>, QueryError> {
        let mut run = EvalRun::default();
        let mut matched = Vec::new();

        for item in items {
            run.scanned += 1;
            let keep = match filter {
                Some(filter) => self.eval_expr(item, filter, &mut run)?,
                None => true,
            };
            if keep {
                run.matched += 1;
                matched.push(item);
            }
        }

        sink::record(MetricsEvent::FilterRun {
            scanned: run.scanned,
            matched: run.matched,
        });

        Ok(matched)
    }

    /// Stable sort by `order`. Key values are extracted once per item.
    pub fn sort<'i, T: Object>(
        &self,
        items: Vec<&'i T>,
        order: &SortOrder,
    ) -> Result<Vec<&'i T>, QueryError> {
        if order.is_empty() {
            return Ok(items);
        }

        let mut rows = items
            .into_iter()
            .map(|item| -> Result<_, QueryError> {
                let keys = order
                    .iter()
                    .map(|key| self.attr_value(item, &key.attr))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok((keys, item))
            })
            .collect::<Result<Vec<_>, _>>()?;

        rows.sort_by(|(left, _), (right, _)| order.compare_values(left, right));

        sink::record(MetricsEvent::SortRun {
            rows: rows.len() as u64,
        });

        Ok(rows.into_iter().map(|(_, item)| item).collect())
    }

    fn eval_expr(
        &self,
        item: &dyn Object,
        filter: &FilterExpr,
        run: &mut EvalRun,
    ) -> Result<bool, QueryError> {
        match filter {
            FilterExpr::And(children) => {
                if children.is_empty() {
                    return Err(QueryError::EmptyJunction { junction: "AND" });
                }
                for child in children {
                    if !self.eval_expr(item, child, run)? {
                        return Ok(false);
                    }
                }

                Ok(true)
            }
            FilterExpr::Or(children) => {
                if children.is_empty() {
                    return Err(QueryError::EmptyJunction { junction: "OR" });
                }
                for child in children {
                    if self.eval_expr(item, child, run)? {
                        return Ok(true);
                    }
                }

                Ok(false)
            }
            FilterExpr::Not(child) => Ok(!self.eval_expr(item, child, run)?),
            FilterExpr::Compare(compare) => {
                let actual = self.attr_value(item, &compare.attr)?;

                match self.handlers.get(&compare.op.kind) {
                    Some(handler) => handler.evaluate(compare, &actual),
                    None => compare::builtin(compare, &actual, &mut run.like),
                }
            }
        }
    }
}

impl fmt::Debug for InMemQueryEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemQueryEvaluator")
            .field("config", self.paths.config())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
