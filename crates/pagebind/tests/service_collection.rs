mod common;

use common::{FakeService, Product, attr, product_options, products};
use pagebind::{
    obs::{metrics_report, metrics_reset_all},
    prelude::*,
    query::SortKey,
    value::ValueType,
};

fn collection(count: i64, page_size: usize, block_size: usize) -> QueryServiceCollection<FakeService> {
    let source = format!("[collection]\npage_size = {page_size}\nblock_size = {block_size}\n");
    let config = Config::from_toml_str(&source).expect("collection config should decode");

    QueryServiceCollection::with_config(FakeService::new(products(count)), product_options(), &config)
        .expect("collection config should validate")
}

fn skus(items: &[Product]) -> Vec<i64> {
    items.iter().map(|p| p.sku).collect()
}

#[test]
fn selecting_all_of_nineteen_items_is_block_wise() {
    let mut c = collection(19, 5, 2);

    assert!(c.select_all(true).expect("select_all should apply"));
    let selected = c.selected_items().expect("selected items should load");

    assert_eq!(selected.len(), 19);
    assert_eq!(skus(&selected), (1..=19).collect::<Vec<_>>());
    assert!(
        c.service().calls() <= 19usize.div_ceil(2) + 1,
        "iterating every item must stay block-wise, made {} calls",
        c.service().calls()
    );
}

#[test]
fn select_all_then_deselect_answers_without_loading() {
    let mut c = collection(19, 5, 2);
    let first_page = c.items_on_page().expect("first page should load");
    let calls_before = c.service().calls();

    assert!(c.select_all(true).expect("select_all should apply"));
    assert!(c.select(false, &first_page[..1]).expect("deselect should apply"));

    assert!(!c.is_selected(&first_page[0]).expect("id should resolve"));
    assert!(c.is_selected(&first_page[1]).expect("id should resolve"));
    assert!(
        c.is_selected(&Product::new(19, "item-19", 0))
            .expect("id should resolve"),
        "items never loaded are selected too"
    );
    assert_eq!(c.num_of_selected_items(), 18);
    assert!(
        c.service().calls() - calls_before <= 1,
        "select_all may cost one count call at most"
    );
}

#[test]
fn consecutive_pages_reuse_blocks() {
    let mut c = collection(40, 5, 10);

    assert_eq!(skus(&c.items_on_page().expect("page 1")), vec![1, 2, 3, 4, 5]);
    assert!(c.next_page().expect("count should load"));
    assert_eq!(skus(&c.items_on_page().expect("page 2")), vec![6, 7, 8, 9, 10]);

    assert_eq!(c.service().item_fetches.get(), 1, "one block serves both pages");
    assert_eq!(c.service().count_fetches.get(), 1);
}

#[test]
fn changing_params_invalidates_cached_pages() {
    metrics_reset_all();
    let mut c = collection(20, 5, 10);
    c.items_on_page().expect("page should load");

    let cheap = FilterExpr::compare(attr("price", ValueType::Int), CompOpKind::Lt, 30);
    let params = QueryParams::new()
        .with_filter(cheap)
        .with_sort_order(SortKey::desc(attr("price", ValueType::Int)));
    c.set_query_params(params).expect("declared params should validate");

    let page = c.items_on_page().expect("filtered page should load");
    assert!(page.iter().all(|p| p.price < 30));
    assert!(page.windows(2).all(|w| w[0].price >= w[1].price));
    assert_eq!(c.service().item_fetches.get(), 2);
    assert_eq!(metrics_report().counters.page_cache_invalidations, 1);
}

#[test]
fn explicit_selection_loads_by_id_in_one_call() {
    let mut c = collection(30, 5, 10);
    let page = c.items_on_page().expect("page should load");
    c.select(true, &page[1..3]).expect("select should apply");

    let before = c.service().id_lookups.get();
    let selected = c.selected_items().expect("selected items should load");

    assert_eq!(skus(&selected), vec![2, 3]);
    assert_eq!(c.service().id_lookups.get() - before, 1);
}

#[test]
fn pages_past_the_end_are_empty() {
    let mut c = collection(7, 5, 5);

    assert_eq!(c.num_of_pages().expect("count should load"), 2);
    assert!(c.items_on_page_idx(3).expect("past end").is_empty());
    assert_eq!(c.idx_of_first_item_on_page().expect("count"), 1);

    c.set_current_page_idx(2);
    assert_eq!(c.idx_of_last_item_on_page().expect("count"), 7);
    assert_eq!(skus(&c.items_on_page().expect("page 2")), vec![6, 7]);
}

#[test]
fn unfiltered_count_is_cached_until_cleared() {
    let mut c = collection(12, 5, 5);

    assert_eq!(c.num_of_unfiltered_items().expect("count"), 12);
    assert_eq!(c.num_of_unfiltered_items().expect("count"), 12);
    assert_eq!(c.service().count_fetches.get(), 1);

    c.clear_caches();
    assert_eq!(c.num_of_unfiltered_items().expect("count"), 12);
    assert_eq!(c.service().count_fetches.get(), 2);
}

#[test]
fn select_all_is_judged_against_its_filter_after_refiltering() {
    let mut c = collection(20, 5, 10);
    let everything = c.items_in_range(0, 20).expect("items should load");

    let cheap = FilterExpr::compare(attr("price", ValueType::Int), CompOpKind::Lt, 30);
    c.set_query_params(QueryParams::new().with_filter(cheap))
        .expect("declared params should validate");
    assert!(c.select_all(true).expect("select_all should apply"));
    let universe_size = c.num_of_items().expect("count should load");

    c.set_query_params(QueryParams::new())
        .expect("unfiltered params should validate");
    let pricey = everything.iter().find(|p| p.price >= 30).expect("some item costs 30+");
    let cheap_item = everything.iter().find(|p| p.price < 30).expect("some item is cheap");

    let checks_before = c.service().membership_checks.get();
    assert!(!c.is_selected(pricey).expect("membership should resolve"));
    assert!(c.is_selected(cheap_item).expect("membership should resolve"));
    assert_eq!(c.service().membership_checks.get() - checks_before, 2);

    // deselecting an item that was never part of the selection is a no-op
    assert!(c.select(false, std::slice::from_ref(pricey)).expect("deselect should apply"));
    assert_eq!(c.num_of_selected_items(), universe_size);

    let selected = c.selected_items().expect("selected items should load");
    assert_eq!(selected.len(), universe_size);
    assert!(selected.iter().all(|p| p.price < 30));
}

#[test]
fn explicit_selection_skips_items_gone_from_the_service() {
    let mut c = collection(10, 5, 5);
    let page = c.items_on_page().expect("page should load");
    c.select(true, &page[..3]).expect("select should apply");

    c.service().remove(2);
    let selected = c.selected_items().expect("missing items are skipped");

    assert_eq!(skus(&selected), vec![1, 3]);
}
