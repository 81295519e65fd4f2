//! Pageable collections: the shared paging, query and selection contract
//! plus its in-memory and query-service variants.

mod cache;
mod memory;
mod service;
pub mod window;

use crate::{
    query::{QueryError, QueryOptions, QueryParams},
    selection::{Selection, SelectionError, SelectionHandler},
    value::Value,
};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

// re-exports
pub use cache::PageCache;
pub use memory::InMemCollection;
pub use service::{QueryService, QueryServiceCollection, ServiceError};

///
/// CollectionError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CollectionError {
    #[error("page index must be at least 1, got {idx}")]
    InvalidPageIdx { idx: usize },

    #[error("page size must be greater than zero")]
    InvalidPageSize,

    #[error("item is not part of this collection")]
    ForeignItem,

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

///
/// PageableCollection
///
/// Paging, counting, query and selection facade over a filtered and sorted
/// item set. Counts and pages may be cached, so readers take `&mut self`;
/// `clear_caches` forces recomputation.
///

pub trait PageableCollection {
    type Item;

    // --- paging ---

    fn page_size(&self) -> usize;

    /// Zero is rejected; the current page index is left as is.
    fn set_page_size(&mut self, page_size: usize) -> Result<(), CollectionError>;

    fn current_page_idx(&self) -> usize;

    /// Values below 1 clamp to 1. The upper bound is not clamped.
    fn set_current_page_idx(&mut self, idx: usize);

    /// Number of items matching the current filter.
    fn num_of_items(&mut self) -> Result<usize, CollectionError>;

    /// Number of items ignoring the filter.
    fn num_of_unfiltered_items(&mut self) -> Result<usize, CollectionError>;

    /// Filtered and sorted items in the 0-based range `start..start + len`,
    /// clipped to the item count.
    fn items_in_range(&mut self, start: usize, len: usize)
    -> Result<Vec<Self::Item>, CollectionError>;

    // --- query ---

    fn query_options(&self) -> &QueryOptions;

    fn query_params(&self) -> &QueryParams;

    /// Replace the params wholesale. They are validated against the
    /// options first; cached pages and counts are dropped.
    fn set_query_params(&mut self, params: QueryParams) -> Result<(), CollectionError>;

    /// Drop cached counts and pages. Safe to call at any time.
    fn clear_caches(&mut self);

    // --- selection ---

    /// Identity of `item` as tracked by the selection.
    fn id_of(&self, item: &Self::Item) -> Result<Value, CollectionError>;

    /// Whether `item` matches `universe`, the params recorded by an "all
    /// except" selection. Decided per item, without loading the universe.
    fn in_universe(&self, item: &Self::Item, universe: &QueryParams)
    -> Result<bool, CollectionError>;

    /// Items with the given ids; ids that no longer resolve are skipped.
    fn items_for_ids(&mut self, ids: &[Value]) -> Result<Vec<Self::Item>, CollectionError>;

    fn selection_handler(&self) -> &SelectionHandler;

    fn selection_handler_mut(&mut self) -> &mut SelectionHandler;

    /// Materialize the selected items.
    fn selected_items(&mut self) -> Result<Vec<Self::Item>, CollectionError>;

    // --- provided ---

    /// Items on `page_idx`; pages past the end are empty, page 0 is an error.
    fn items_on_page_idx(&mut self, page_idx: usize) -> Result<Vec<Self::Item>, CollectionError> {
        if page_idx < 1 {
            return Err(CollectionError::InvalidPageIdx { idx: page_idx });
        }

        let range = window::page_range(page_idx, self.page_size());

        self.items_in_range(range.start, range.len())
    }

    fn items_on_page(&mut self) -> Result<Vec<Self::Item>, CollectionError> {
        self.items_on_page_idx(self.current_page_idx())
    }

    fn num_of_pages(&mut self) -> Result<usize, CollectionError> {
        let total = self.num_of_items()?;
        Ok(window::num_of_pages(total, self.page_size()))
    }

    /// 1-based position of the first item on the current page, 0 if empty.
    fn idx_of_first_item_on_page(&mut self) -> Result<usize, CollectionError> {
        let total = self.num_of_items()?;
        Ok(window::idx_of_first_item(
            self.current_page_idx(),
            self.page_size(),
            total,
        ))
    }

    fn idx_of_last_item_on_page(&mut self) -> Result<usize, CollectionError> {
        let total = self.num_of_items()?;
        Ok(window::idx_of_last_item(
            self.current_page_idx(),
            self.page_size(),
            total,
        ))
    }

    /// Advance one page; no-op on the last page.
    fn next_page(&mut self) -> Result<bool, CollectionError> {
        let current = self.current_page_idx();
        if current >= self.num_of_pages()? {
            return Ok(false);
        }
        self.set_current_page_idx(current + 1);

        Ok(true)
    }

    /// Go back one page; no-op on the first page.
    fn prev_page(&mut self) -> bool {
        let current = self.current_page_idx();
        if current <= 1 {
            return false;
        }
        self.set_current_page_idx(current - 1);

        true
    }

    fn first_page(&mut self) -> bool {
        if self.current_page_idx() == 1 {
            return false;
        }
        self.set_current_page_idx(1);

        true
    }

    fn last_page(&mut self) -> Result<bool, CollectionError> {
        let last = self.num_of_pages()?.max(1);
        if self.current_page_idx() == last {
            return Ok(false);
        }
        self.set_current_page_idx(last);

        Ok(true)
    }

    /// Select or deselect `items`. `Ok(false)` means a listener vetoed.
    fn select(&mut self, select: bool, items: &[Self::Item]) -> Result<bool, CollectionError> {
        let universe = self.selection_handler().selection().universe().cloned();

        let mut ids = Vec::with_capacity(items.len());
        let mut members = BTreeSet::new();
        for item in items {
            let id = self.id_of(item)?;
            if let Some(universe) = &universe
                && self.in_universe(item, universe)?
            {
                members.insert(id.clone());
            }
            ids.push(id);
        }

        Ok(self
            .selection_handler_mut()
            .select_ids_in(select, ids, |id| members.contains(id))?)
    }

    /// Select every item matching the current params, without enumerating
    /// them, or clear the selection.
    fn select_all(&mut self, select: bool) -> Result<bool, CollectionError> {
        let size = if select { self.num_of_items()? } else { 0 };
        let universe = self.query_params().clone();

        Ok(self
            .selection_handler_mut()
            .select_all(select, universe, size)?)
    }

    /// Invert within the current params. Explicitly selected items that do
    /// not match them stay selected.
    fn invert_selection(&mut self) -> Result<bool, CollectionError> {
        let size = self.num_of_items()?;
        let universe = self.query_params().clone();

        let mut members = BTreeSet::new();
        if let Selection::Explicit(ids) = self.selection_handler().selection()
            && !ids.is_empty()
        {
            let ids: Vec<Value> = ids.iter().cloned().collect();
            for item in self.items_for_ids(&ids)? {
                if self.in_universe(&item, &universe)? {
                    members.insert(self.id_of(&item)?);
                }
            }
        }

        Ok(self
            .selection_handler_mut()
            .invert_in(universe, size, |id| members.contains(id))?)
    }

    /// Answered from the selection and, for an "all except" selection, one
    /// membership check of `item` against the recorded universe.
    fn is_selected(&self, item: &Self::Item) -> Result<bool, CollectionError> {
        let id = self.id_of(item)?;
        let selection = self.selection_handler().selection();
        let in_universe = match selection.universe() {
            Some(universe) => self.in_universe(item, universe)?,
            None => true,
        };

        Ok(selection.contains_member(&id, in_universe))
    }

    fn num_of_selected_items(&self) -> usize {
        self.selection_handler().selection().len()
    }
}
