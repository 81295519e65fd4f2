use crate::query::{FilterExpr, SortOrder};

///
/// QueryParams
///
/// Live filter and sort for one collection. Replaced wholesale on re-query;
/// equality drives page cache invalidation.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryParams {
    pub filter: Option<FilterExpr>,
    pub sort_order: SortOrder,
    pub default_sort_order: SortOrder,
}

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_sort_order(mut self, sort_order: impl Into<SortOrder>) -> Self {
        self.sort_order = sort_order.into();
        self
    }

    #[must_use]
    pub fn with_default_sort_order(mut self, sort_order: impl Into<SortOrder>) -> Self {
        self.default_sort_order = sort_order.into();
        self
    }

    /// The explicit sort order, or the default when none was chosen.
    #[must_use]
    pub fn effective_sort_order(&self) -> &SortOrder {
        if self.sort_order.is_empty() {
            &self.default_sort_order
        } else {
            &self.sort_order
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{QueryAttr, SortKey};

    #[test]
    fn default_order_applies_only_without_explicit_order() {
        let by = |path: &str| SortKey::asc(QueryAttr::path(path).expect("path should parse"));
        let params = QueryParams::new().with_default_sort_order(by("id"));

        assert_eq!(params.effective_sort_order()[0].attr.name(), "id");

        let params = params.with_sort_order(by("name"));
        assert_eq!(params.effective_sort_order()[0].attr.name(), "name");
    }
}
