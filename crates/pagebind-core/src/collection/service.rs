use crate::{
    collection::{CollectionError, PageCache, PageableCollection},
    config::{Config, ConfigError},
    obs::sink::{self, MetricsEvent},
    query::{QueryOptions, QueryParams},
    selection::{Selection, SelectionHandler},
    value::Value,
};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

///
/// ServiceError
///
/// Opaque failure reported by a backing query service.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("query service failed: {message}")]
pub struct ServiceError {
    pub message: String,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

///
/// QueryService
///
/// Narrow, page-oriented access to data that lives elsewhere. Calls are
/// blocking; the collection keeps their number low through its page cache.
///

pub trait QueryService {
    type Item;

    /// Up to `len` items matching `params`, starting at 0-based `start`.
    fn fetch_items(
        &self,
        params: &QueryParams,
        start: usize,
        len: usize,
    ) -> Result<Vec<Self::Item>, ServiceError>;

    /// Number of items matching `params`.
    fn fetch_count(&self, params: &QueryParams) -> Result<usize, ServiceError>;

    /// Number of items ignoring any filter.
    fn fetch_unfiltered_count(&self) -> Result<usize, ServiceError> {
        self.fetch_count(&QueryParams::default())
    }

    /// Whether `item` matches the filter of `params`. Answers membership
    /// in a recorded selection universe without loading it.
    fn matches(&self, params: &QueryParams, item: &Self::Item) -> Result<bool, ServiceError>;

    fn id_of(&self, item: &Self::Item) -> Value;

    fn item_for_id(&self, id: &Value) -> Result<Option<Self::Item>, ServiceError>;

    /// Batch lookup; unknown ids are skipped.
    fn items_for_ids(&self, ids: &[Value]) -> Result<Vec<Self::Item>, ServiceError> {
        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(item) = self.item_for_id(id)? {
                items.push(item);
            }
        }

        Ok(items)
    }
}

///
/// QueryServiceCollection
///
/// Pageable collection over a `QueryService`. Pages and counts come from a
/// block cache bound to the current params, so walking consecutive pages
/// or checking selection state costs few service calls.
///

pub struct QueryServiceCollection<S: QueryService> {
    service: S,
    options: QueryOptions,
    params: QueryParams,
    cache: PageCache<S::Item>,
    unfiltered_count: Option<usize>,
    page_size: usize,
    current_page_idx: usize,
    selection: SelectionHandler,
}

impl<S> QueryServiceCollection<S>
where
    S: QueryService,
    S::Item: Clone,
{
    #[must_use]
    pub fn new(service: S, options: QueryOptions) -> Self {
        Self::build(service, options, &Config::default())
    }

    pub fn with_config(
        service: S,
        options: QueryOptions,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self::build(service, options, config))
    }

    fn build(service: S, options: QueryOptions, config: &Config) -> Self {
        let collection = &config.collection;

        Self {
            service,
            params: options.default_params(),
            options,
            cache: PageCache::new(collection.block_size, collection.max_cached_blocks),
            unfiltered_count: None,
            page_size: collection.page_size,
            current_page_idx: 1,
            selection: SelectionHandler::new(collection.select_mode),
        }
    }

    #[must_use]
    pub const fn service(&self) -> &S {
        &self.service
    }

    #[must_use]
    pub const fn cache(&self) -> &PageCache<S::Item> {
        &self.cache
    }

    // Every item matching `universe`, block by block. The page cache is
    // used when `universe` is the current params; otherwise blocks go
    // straight to the service so the cache keeps its pages.
    fn scan(&mut self, universe: &QueryParams) -> Result<Vec<S::Item>, CollectionError> {
        let block_size = self.cache.block_size();
        let mut items = Vec::new();
        let mut start = 0;

        loop {
            let block = if *universe == self.params {
                self.cache
                    .items(&self.service, &self.params, start..start + block_size)?
            } else {
                let block = self.service.fetch_items(universe, start, block_size)?;
                sink::record(MetricsEvent::ServiceFetchItems {
                    start: start as u64,
                    requested: block_size as u64,
                    returned: block.len() as u64,
                });
                block
            };

            let done = block.len() < block_size;
            items.extend(block);
            if done {
                return Ok(items);
            }
            start += block_size;
        }
    }
}

impl<S> PageableCollection for QueryServiceCollection<S>
where
    S: QueryService,
    S::Item: Clone,
{
    type Item = S::Item;

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
        self.cache.count(&self.service, &self.params)
    }

    fn num_of_unfiltered_items(&mut self) -> Result<usize, CollectionError> {
        if let Some(count) = self.unfiltered_count {
            return Ok(count);
        }

        sink::record(MetricsEvent::ServiceFetchCount);
        let count = self.service.fetch_unfiltered_count()?;
        self.unfiltered_count = Some(count);

        Ok(count)
    }

    fn items_in_range(
        &mut self,
        start: usize,
        len: usize,
    ) -> Result<Vec<S::Item>, CollectionError> {
        self.cache
            .items(&self.service, &self.params, start..start.saturating_add(len))
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
            self.cache.invalidate();
        }

        Ok(())
    }

    fn clear_caches(&mut self) {
        self.cache.invalidate();
        self.unfiltered_count = None;
    }

    fn id_of(&self, item: &S::Item) -> Result<Value, CollectionError> {
        Ok(self.service.id_of(item))
    }

    fn in_universe(&self, item: &S::Item, universe: &QueryParams) -> Result<bool, CollectionError> {
        if universe.filter.is_none() {
            return Ok(true);
        }

        Ok(self.service.matches(universe, item)?)
    }

    fn items_for_ids(&mut self, ids: &[Value]) -> Result<Vec<S::Item>, CollectionError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self.service.items_for_ids(ids)?)
    }

    fn selection_handler(&self) -> &SelectionHandler {
        &self.selection
    }

    fn selection_handler_mut(&mut self) -> &mut SelectionHandler {
        &mut self.selection
    }

    fn selected_items(&mut self) -> Result<Vec<S::Item>, CollectionError> {
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
                let mut items = self.scan(&universe)?;
                items.retain(|item| !excluded.contains(&self.service.id_of(item)));

                let seen: BTreeSet<Value> =
                    items.iter().map(|item| self.service.id_of(item)).collect();
                let included: Vec<Value> = included
                    .into_iter()
                    .filter(|id| !seen.contains(id))
                    .collect();
                items.extend(self.items_for_ids(&included)?);

                Ok(items)
            }
        }
    }
}
