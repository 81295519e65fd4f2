use crate::{
    query::{CompOpKind, FilterExpr, QueryAttr, QueryError, QueryParams, SortOrder},
    value::{Value, ValueType},
};
use std::collections::{BTreeMap, BTreeSet};

///
/// FilterDef
///
/// One filterable attribute and the operators allowed on it. An empty
/// operator set allows every operator.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FilterDef {
    pub attr: QueryAttr,
    pub ops: BTreeSet<CompOpKind>,
}

impl FilterDef {
    #[must_use]
    pub fn new(attr: impl Into<QueryAttr>) -> Self {
        Self {
            attr: attr.into(),
            ops: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_ops(mut self, ops: impl IntoIterator<Item = CompOpKind>) -> Self {
        self.ops.extend(ops);
        self
    }

    #[must_use]
    pub fn allows(&self, op: &CompOpKind) -> bool {
        self.ops.is_empty() || self.ops.contains(op)
    }
}

///
/// QueryOptions
///
/// Declared universe of filterable and sortable attributes for a
/// collection, its default order and its identity attribute.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryOptions {
    filters: BTreeMap<String, FilterDef>,
    sortable: BTreeMap<String, QueryAttr>,
    default_sort_order: SortOrder,
    id_attr: Option<QueryAttr>,
}

impl QueryOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_filter(mut self, def: FilterDef) -> Self {
        self.filters.insert(def.attr.name().to_string(), def);
        self
    }

    #[must_use]
    pub fn with_sortable(mut self, attr: impl Into<QueryAttr>) -> Self {
        let attr = attr.into();
        self.sortable.insert(attr.name().to_string(), attr);
        self
    }

    #[must_use]
    pub fn with_default_sort_order(mut self, order: impl Into<SortOrder>) -> Self {
        self.default_sort_order = order.into();
        self
    }

    #[must_use]
    pub fn with_id_attr(mut self, attr: impl Into<QueryAttr>) -> Self {
        self.id_attr = Some(attr.into());
        self
    }

    #[must_use]
    pub fn filter_def(&self, name: &str) -> Option<&FilterDef> {
        self.filters.get(name)
    }

    pub fn filter_defs(&self) -> impl Iterator<Item = &FilterDef> {
        self.filters.values()
    }

    pub fn sortable_attrs(&self) -> impl Iterator<Item = &QueryAttr> {
        self.sortable.values()
    }

    #[must_use]
    pub const fn default_sort_order(&self) -> &SortOrder {
        &self.default_sort_order
    }

    #[must_use]
    pub const fn id_attr(&self) -> Option<&QueryAttr> {
        self.id_attr.as_ref()
    }

    /// Fresh params carrying this option set's default order.
    #[must_use]
    pub fn default_params(&self) -> QueryParams {
        QueryParams::new().with_default_sort_order(self.default_sort_order.clone())
    }

    /// Check that `params` only filters and sorts by declared attributes,
    /// with allowed operators and literals of a compatible type.
    pub fn validate(&self, params: &QueryParams) -> Result<(), QueryError> {
        if let Some(filter) = &params.filter {
            self.validate_filter(filter)?;
        }

        for key in params.sort_order.iter() {
            if !self.sortable.contains_key(key.attr.name()) {
                return Err(QueryError::SortNotAllowed {
                    attr: key.attr.name().to_string(),
                });
            }
        }

        Ok(())
    }

    fn validate_filter(&self, filter: &FilterExpr) -> Result<(), QueryError> {
        let mut result = Ok(());

        filter.for_each_compare(&mut |compare| {
            if result.is_err() {
                return;
            }

            let name = compare.attr.name();
            let Some(def) = self.filters.get(name) else {
                result = Err(QueryError::FilterNotAllowed {
                    attr: name.to_string(),
                });
                return;
            };

            if !def.allows(&compare.op.kind) {
                result = Err(QueryError::OperatorNotAllowed {
                    attr: name.to_string(),
                    op: compare.op.kind.clone(),
                });
                return;
            }

            if !literal_fits(def, &compare.op.kind, &compare.value) {
                result = Err(QueryError::LiteralType {
                    attr: name.to_string(),
                    expected: def.attr.value_type(),
                    found: compare.value.value_type(),
                });
            }
        });

        result
    }
}

fn literal_fits(def: &FilterDef, op: &CompOpKind, literal: &Value) -> bool {
    let declared = def.attr.value_type();

    match op {
        CompOpKind::IsNull | CompOpKind::Custom(_) => true,
        CompOpKind::In => literal
            .as_list()
            .is_none_or(|items| items.iter().all(|item| declared.accepts(item.value_type()))),
        _ => declared.accepts(literal.value_type()),
    }
}
