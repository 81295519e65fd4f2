//! Shared fixtures: a derived item type and a call-counting query service
//! backed by the in-memory evaluator.

#![allow(dead_code)]

use pagebind::{
    collection::ServiceError,
    prelude::*,
    query::{FilterDef, PathAttr, SortKey},
    value::ValueType,
};
use std::cell::{Cell, RefCell};

#[derive(Clone, Debug, Default, Members, PartialEq)]
pub struct Supplier {
    pub name: String,
    pub country: Option<String>,
}

#[derive(Clone, Debug, Default, Members, PartialEq)]
pub struct Product {
    #[members(readonly)]
    pub sku: i64,
    pub name: String,
    pub price: i64,
    pub supplier: Option<Supplier>,
}

impl Product {
    pub fn new(sku: i64, name: &str, price: i64) -> Self {
        Self {
            sku,
            name: name.to_string(),
            price,
            supplier: None,
        }
    }

    pub fn supplied_by(mut self, name: &str, country: &str) -> Self {
        self.supplier = Some(Supplier {
            name: name.to_string(),
            country: Some(country.to_string()),
        });
        self
    }
}

/// `count` products with skus `1..=count`, named `item-01`...
pub fn products(count: i64) -> Vec<Product> {
    (1..=count)
        .map(|sku| Product::new(sku, &format!("item-{sku:02}"), sku * 10 % 70))
        .collect()
}

pub fn attr(path: &str, value_type: ValueType) -> PathAttr {
    PathAttr::new(path, value_type).expect("attribute path should parse")
}

pub fn product_options() -> QueryOptions {
    QueryOptions::new()
        .with_filter(FilterDef::new(attr("name", ValueType::Text)))
        .with_filter(FilterDef::new(attr("price", ValueType::Int)))
        .with_sortable(attr("name", ValueType::Text))
        .with_sortable(attr("price", ValueType::Int))
        .with_default_sort_order(SortKey::asc(attr("sku", ValueType::Int)))
        .with_id_attr(attr("sku", ValueType::Int))
}

///
/// FakeService
///
/// Serves a product list, filtering and sorting with the in-memory
/// evaluator, and counts every call. Products can be removed behind the
/// collection's back.
///

pub struct FakeService {
    products: RefCell<Vec<Product>>,
    evaluator: InMemQueryEvaluator,
    pub item_fetches: Cell<usize>,
    pub count_fetches: Cell<usize>,
    pub id_lookups: Cell<usize>,
    pub membership_checks: Cell<usize>,
}

impl FakeService {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: RefCell::new(products),
            evaluator: InMemQueryEvaluator::new(EvalConfig::default()),
            item_fetches: Cell::new(0),
            count_fetches: Cell::new(0),
            id_lookups: Cell::new(0),
            membership_checks: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.item_fetches.get()
            + self.count_fetches.get()
            + self.id_lookups.get()
            + self.membership_checks.get()
    }

    pub fn remove(&self, sku: i64) {
        self.products.borrow_mut().retain(|product| product.sku != sku);
    }

    fn matching(&self, params: &QueryParams) -> Result<Vec<Product>, ServiceError> {
        let products = self.products.borrow();
        let matched = self
            .evaluator
            .evaluate_subset(products.iter(), params.filter.as_ref())
            .map_err(|err| ServiceError::new(err.to_string()))?;

        let sorted = self
            .evaluator
            .sort(matched, params.effective_sort_order())
            .map_err(|err| ServiceError::new(err.to_string()))?;

        Ok(sorted.into_iter().cloned().collect())
    }
}

fn bump(cell: &Cell<usize>) {
    cell.set(cell.get() + 1);
}

impl QueryService for FakeService {
    type Item = Product;

    fn fetch_items(
        &self,
        params: &QueryParams,
        start: usize,
        len: usize,
    ) -> Result<Vec<Product>, ServiceError> {
        bump(&self.item_fetches);

        Ok(self
            .matching(params)?
            .into_iter()
            .skip(start)
            .take(len)
            .collect())
    }

    fn fetch_count(&self, params: &QueryParams) -> Result<usize, ServiceError> {
        bump(&self.count_fetches);

        Ok(self.matching(params)?.len())
    }

    fn matches(&self, params: &QueryParams, item: &Product) -> Result<bool, ServiceError> {
        bump(&self.membership_checks);

        match &params.filter {
            Some(filter) => self
                .evaluator
                .evaluate(item, filter)
                .map_err(|err| ServiceError::new(err.to_string())),
            None => Ok(true),
        }
    }

    fn id_of(&self, item: &Product) -> Value {
        Value::Int(item.sku)
    }

    fn item_for_id(&self, id: &Value) -> Result<Option<Product>, ServiceError> {
        Ok(self.items_for_ids(std::slice::from_ref(id))?.pop())
    }

    fn items_for_ids(&self, ids: &[Value]) -> Result<Vec<Product>, ServiceError> {
        bump(&self.id_lookups);

        Ok(self
            .products
            .borrow()
            .iter()
            .filter(|product| ids.contains(&Value::Int(product.sku)))
            .cloned()
            .collect())
    }
}
