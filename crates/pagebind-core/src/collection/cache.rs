use crate::{
    collection::{CollectionError, QueryService, window},
    obs::sink::{self, MetricsEvent},
    query::QueryParams,
};
use std::{
    collections::{HashMap, VecDeque},
    ops::Range,
};

///
/// PageCache
///
/// Fetched item blocks and the filtered count for one set of query params.
/// Any change of params drops everything. Blocks are `block_size` items
/// wide and aligned to multiples of it; runs of missing blocks are fetched
/// with a single service call. A block shorter than `block_size` marks
/// the end of the data, which fixes the count without `fetch_count`.
///

#[derive(Debug)]
pub struct PageCache<I> {
    params: Option<QueryParams>,
    block_size: usize,
    max_blocks: usize,
    blocks: HashMap<usize, Vec<I>>,
    order: VecDeque<usize>,
    count: Option<usize>,
}

impl<I: Clone> PageCache<I> {
    #[must_use]
    pub fn new(block_size: usize, max_blocks: usize) -> Self {
        Self {
            params: None,
            block_size: block_size.max(1),
            max_blocks: max_blocks.max(1),
            blocks: HashMap::new(),
            order: VecDeque::new(),
            count: None,
        }
    }

    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    #[must_use]
    pub fn cached_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Count known without another service call, if any.
    #[must_use]
    pub const fn known_count(&self) -> Option<usize> {
        self.count
    }

    /// Drop all blocks and the count.
    pub fn invalidate(&mut self) {
        if self.params.is_some() || !self.blocks.is_empty() || self.count.is_some() {
            sink::record(MetricsEvent::PageCacheInvalidated);
        }

        self.params = None;
        self.blocks.clear();
        self.order.clear();
        self.count = None;
    }

    /// Filtered item count for `params`.
    pub fn count<S>(&mut self, service: &S, params: &QueryParams) -> Result<usize, CollectionError>
    where
        S: QueryService<Item = I> + ?Sized,
    {
        self.bind(params);

        if let Some(count) = self.count {
            sink::record(MetricsEvent::PageCacheHit);
            return Ok(count);
        }

        sink::record(MetricsEvent::PageCacheMiss);
        sink::record(MetricsEvent::ServiceFetchCount);
        let count = service.fetch_count(params)?;
        self.count = Some(count);

        Ok(count)
    }

    /// Items in `range` for `params`, clipped to the end of the data.
    pub fn items<S>(
        &mut self,
        service: &S,
        params: &QueryParams,
        range: Range<usize>,
    ) -> Result<Vec<I>, CollectionError>
    where
        S: QueryService<Item = I> + ?Sized,
    {
        self.bind(params);

        let range = match self.count {
            Some(count) => window::clip(range, count),
            None => range,
        };
        let span = window::block_span(&range, self.block_size);

        self.fill(service, params, span.clone())?;

        let mut items = Vec::with_capacity(range.len());
        for block in span {
            let Some(rows) = self.blocks.get(&block) else {
                break;
            };

            let base = block * self.block_size;
            let from = range.start.saturating_sub(base).min(rows.len());
            let to = range.end.saturating_sub(base).min(rows.len());
            items.extend_from_slice(&rows[from..to]);
        }

        self.evict();

        Ok(items)
    }

    fn bind(&mut self, params: &QueryParams) {
        if self.params.as_ref() != Some(params) {
            self.invalidate();
            self.params = Some(params.clone());
        }
    }

    // Fetch every missing block of `span`, one call per contiguous run.
    fn fill<S>(
        &mut self,
        service: &S,
        params: &QueryParams,
        span: Range<usize>,
    ) -> Result<(), CollectionError>
    where
        S: QueryService<Item = I> + ?Sized,
    {
        let mut block = span.start;

        while block < span.end {
            if self.past_end(block) {
                break;
            }
            if self.blocks.contains_key(&block) {
                sink::record(MetricsEvent::PageCacheHit);
                block += 1;
                continue;
            }

            let run_start = block;
            while block < span.end && !self.blocks.contains_key(&block) && !self.past_end(block) {
                sink::record(MetricsEvent::PageCacheMiss);
                block += 1;
            }

            if !self.fetch_run(service, params, run_start..block)? {
                break;
            }
        }

        Ok(())
    }

    // Returns false once the end of the data was reached.
    fn fetch_run<S>(
        &mut self,
        service: &S,
        params: &QueryParams,
        run: Range<usize>,
    ) -> Result<bool, CollectionError>
    where
        S: QueryService<Item = I> + ?Sized,
    {
        let start = run.start * self.block_size;
        let requested = run.len() * self.block_size;
        let rows = service.fetch_items(params, start, requested)?;

        sink::record(MetricsEvent::ServiceFetchItems {
            start: start as u64,
            requested: requested as u64,
            returned: rows.len() as u64,
        });

        let complete = rows.len() >= requested;
        if !complete {
            self.count = Some(start + rows.len());
        }

        let mut rows = rows.into_iter();
        for block in run {
            let chunk: Vec<I> = rows.by_ref().take(self.block_size).collect();
            if chunk.is_empty() {
                break;
            }
            self.insert(block, chunk);
        }

        Ok(complete)
    }

    fn past_end(&self, block: usize) -> bool {
        self.count
            .is_some_and(|count| block * self.block_size >= count)
    }

    fn insert(&mut self, block: usize, rows: Vec<I>) {
        if self.blocks.insert(block, rows).is_none() {
            self.order.push_back(block);
        }
    }

    // Oldest blocks go first.
    fn evict(&mut self) {
        while self.blocks.len() > self.max_blocks {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.blocks.remove(&oldest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collection::ServiceError,
        query::{QueryAttr, SortKey},
        value::Value,
    };
    use std::cell::Cell;

    struct Numbers {
        total: usize,
        fetches: Cell<usize>,
        counts: Cell<usize>,
    }

    impl Numbers {
        fn new(total: usize) -> Self {
            Self {
                total,
                fetches: Cell::new(0),
                counts: Cell::new(0),
            }
        }
    }

    impl QueryService for Numbers {
        type Item = usize;

        fn fetch_items(
            &self,
            _params: &QueryParams,
            start: usize,
            len: usize,
        ) -> Result<Vec<usize>, ServiceError> {
            self.fetches.set(self.fetches.get() + 1);
            Ok((start..(start + len).min(self.total)).collect())
        }

        fn fetch_count(&self, _params: &QueryParams) -> Result<usize, ServiceError> {
            self.counts.set(self.counts.get() + 1);
            Ok(self.total)
        }

        fn matches(&self, _params: &QueryParams, _item: &usize) -> Result<bool, ServiceError> {
            Ok(true)
        }

        fn id_of(&self, item: &usize) -> Value {
            Value::Int(i64::try_from(*item).unwrap_or(i64::MAX))
        }

        fn item_for_id(&self, id: &Value) -> Result<Option<usize>, ServiceError> {
            Ok(id.as_int().and_then(|n| usize::try_from(n).ok()))
        }
    }

    #[test]
    fn consecutive_pages_share_a_block() {
        let service = Numbers::new(50);
        let params = QueryParams::new();
        let mut cache = PageCache::new(10, 8);

        assert_eq!(cache.items(&service, &params, 0..5).expect("fetch"), (0..5).collect::<Vec<_>>());
        assert_eq!(cache.items(&service, &params, 5..10).expect("fetch"), (5..10).collect::<Vec<_>>());
        assert_eq!(service.fetches.get(), 1);
    }

    #[test]
    fn missing_blocks_are_fetched_in_one_call() {
        let service = Numbers::new(50);
        let params = QueryParams::new();
        let mut cache = PageCache::new(5, 8);

        let items = cache.items(&service, &params, 3..17).expect("fetch");
        assert_eq!(items, (3..17).collect::<Vec<_>>());
        assert_eq!(service.fetches.get(), 1);
        assert_eq!(cache.cached_blocks(), 4);
    }

    #[test]
    fn short_block_fixes_the_count() {
        let service = Numbers::new(7);
        let params = QueryParams::new();
        let mut cache = PageCache::new(5, 8);

        let items = cache.items(&service, &params, 5..10).expect("fetch");
        assert_eq!(items, vec![5, 6]);
        assert_eq!(cache.known_count(), Some(7));
        assert_eq!(cache.count(&service, &params).expect("count"), 7);
        assert_eq!(service.counts.get(), 0);

        assert!(cache.items(&service, &params, 10..15).expect("past end").is_empty());
        assert_eq!(service.fetches.get(), 1);
    }

    #[test]
    fn param_change_invalidates() {
        let service = Numbers::new(20);
        let mut cache = PageCache::new(5, 8);
        let params = QueryParams::new();

        cache.items(&service, &params, 0..5).expect("fetch");
        cache.count(&service, &params).expect("count");

        let by_x = SortKey::asc(QueryAttr::path("x").expect("path should parse"));
        let other = QueryParams::new().with_default_sort_order(by_x);
        cache.items(&service, &other, 0..5).expect("fetch");
        cache.count(&service, &other).expect("count");

        assert_eq!(service.fetches.get(), 2);
        assert_eq!(service.counts.get(), 2);
    }

    #[test]
    fn oldest_blocks_are_evicted() {
        let service = Numbers::new(100);
        let params = QueryParams::new();
        let mut cache = PageCache::new(5, 2);

        for start in [0, 5, 10] {
            cache.items(&service, &params, start..start + 5).expect("fetch");
        }
        assert_eq!(cache.cached_blocks(), 2);

        cache.items(&service, &params, 10..15).expect("cached");
        assert_eq!(service.fetches.get(), 3);

        cache.items(&service, &params, 0..5).expect("refetch");
        assert_eq!(service.fetches.get(), 4);
    }
}
