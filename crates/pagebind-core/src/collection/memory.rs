use crate::{
    collection::{CollectionError, PageableCollection, window},
    config::{CollectionConfig, Config, ConfigError},
    query::{InMemQueryEvaluator, QueryOptions, QueryParams},
    selection::{Selection, SelectionHandler},
    traits::Object,
    value::Value,
};
use std::collections::BTreeSet;

///
/// InMemCollection
///
/// Pageable view over a materialized item list. The filtered and sorted
/// view is computed lazily by the in-memory evaluator and kept until the
/// params or items change.
///
/// Without a declared id attribute, an item's id is its position in the
/// backing list.
///

#[derive(Debug)]
pub struct InMemCollection<T> {
    items: Vec<T>,
    view: Option<Vec<T>>,
    options: QueryOptions,
    params: QueryParams,
    evaluator: InMemQueryEvaluator,
    page_size: usize,
    current_page_idx: usize,
    selection: SelectionHandler,
}

impl<T> InMemCollection<T>
where
    T: Object + Clone + PartialEq,
{
    #[must_use]
    pub fn new(items: Vec<T>, options: QueryOptions) -> Self {
        let config = Config::default();
        let evaluator = InMemQueryEvaluator::new(config.eval);

        Self::build(items, options, evaluator, &config.collection)
    }

    pub fn with_config(
        items: Vec<T>,
        options: QueryOptions,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let evaluator = InMemQueryEvaluator::new(config.eval.clone());

        Ok(Self::build(items, options, evaluator, &config.collection))
    }

    /// Swap in an evaluator, e.g. one with custom operator handlers.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: InMemQueryEvaluator) -> Self {
        self.evaluator = evaluator;
        self.view = None;
        self
    }

    fn build(
        items: Vec<T>,
        options: QueryOptions,
        evaluator: InMemQueryEvaluator,
        config: &CollectionConfig,
    ) -> Self {
        Self {
            items,
            view: None,
            params: options.default_params(),
            options,
            evaluator,
            page_size: config.page_size,
            current_page_idx: 1,
            selection: SelectionHandler::new(config.select_mode),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Replace the backing items. The selection is kept.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.view = None;
    }

    fn view(&mut self) -> Result<&[T], CollectionError> {
        let view = match self.view.take() {
            Some(view) => view,
            None => {
                let matched = self
                    .evaluator
                    .evaluate_subset(&self.items, self.params.filter.as_ref())?;
                let sorted = self
                    .evaluator
                    .sort(matched, self.params.effective_sort_order())?;

                sorted.into_iter().cloned().collect()
            }
        };

        Ok(self.view.insert(view).as_slice())
    }

    fn ids_of_all(&self) -> Result<Vec<Value>, CollectionError> {
        self.items.iter().map(|item| self.id_of(item)).collect()
    }
}

impl<T> PageableCollection for InMemCollection<T>
where
    T: Object + Clone + PartialEq,
{
    type Item = T;

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn set_page_size(&mut self, page_size: usize) -> Result<(), CollectionError> {
        if page_size == 0 {
            return Err(CollectionError::InvalidPageSize);
        }
        self.page_size = page_size;

        Ok(())
    }

    fn current_page_idx(&self) -> usize {
        self.current_page_idx
    }

    fn set_current_page_idx(&mut self, idx: usize) {
        self.current_page_idx = idx.max(1);
    }

    fn num_of_items(&mut self) -> Result<usize, CollectionError> {
        Ok(self.view()?.len())
    }

    fn num_of_unfiltered_items(&mut self) -> Result<usize, CollectionError> {
        Ok(self.items.len())
    }

    fn items_in_range(&mut self, start: usize, len: usize) -> Result<Vec<T>, CollectionError> {
        let view = self.view()?;
        let range = window::clip(start..start.saturating_add(len), view.len());

        Ok(view[range].to_vec())
    }

    fn query_options(&self) -> &QueryOptions {
        &self.options
    }

    fn query_params(&self) -> &QueryParams {
        &self.params
    }

    fn set_query_params(&mut self, params: QueryParams) -> Result<(), CollectionError> {
        self.options.validate(&params)?;
        if params != self.params {
            self.params = params;
            self.view = None;
        }

        Ok(())
    }

    fn clear_caches(&mut self) {
        self.view = None;
    }

    fn id_of(&self, item: &T) -> Result<Value, CollectionError> {
        if let Some(attr) = self.options.id_attr() {
            return Ok(self.evaluator.attr_value(item, attr)?);
        }

        self.items
            .iter()
            .position(|candidate| candidate == item)
            .map(|pos| Value::Int(i64::try_from(pos).unwrap_or(i64::MAX)))
            .ok_or(CollectionError::ForeignItem)
    }

    fn in_universe(&self, item: &T, universe: &QueryParams) -> Result<bool, CollectionError> {
        match &universe.filter {
            Some(filter) => Ok(self.evaluator.evaluate(item, filter)?),
            None => Ok(true),
        }
    }

    fn items_for_ids(&mut self, ids: &[Value]) -> Result<Vec<T>, CollectionError> {
        let wanted: BTreeSet<&Value> = ids.iter().collect();
        let all_ids = self.ids_of_all()?;

        Ok(self
            .items
            .iter()
            .zip(all_ids)
            .filter(|(_, id)| wanted.contains(id))
            .map(|(item, _)| item.clone())
            .collect())
    }

    fn selection_handler(&self) -> &SelectionHandler {
        &self.selection
    }

    fn selection_handler_mut(&mut self) -> &mut SelectionHandler {
        &mut self.selection
    }

    fn selected_items(&mut self) -> Result<Vec<T>, CollectionError> {
        match self.selection.selection().clone() {
            Selection::Explicit(ids) => {
                let ids: Vec<Value> = ids.into_iter().collect();
                self.items_for_ids(&ids)
            }
            Selection::AllExcept {
                universe,
                excluded,
                included,
                ..
            } => {
                let matched = self
                    .evaluator
                    .evaluate_subset(&self.items, universe.filter.as_ref())?;
                let sorted = self
                    .evaluator
                    .sort(matched, universe.effective_sort_order())?;

                let mut selected = Vec::with_capacity(sorted.len() + included.len());
                let mut seen = BTreeSet::new();
                for item in sorted {
                    let id = self.id_of(item)?;
                    if !excluded.contains(&id) {
                        selected.push(item.clone());
                        seen.insert(id);
                    }
                }

                let included: Vec<Value> = included.into_iter().collect();
                for item in self.items_for_ids(&included)? {
                    if !seen.contains(&self.id_of(&item)?) {
                        selected.push(item);
                    }
                }

                Ok(selected)
            }
        }
    }
}
