use std::sync::Arc;

use super::common::*;

use crate::inventory::domain::PropertyId;
use crate::inventory::engine::InventoryQueryEngine;
use crate::inventory::query::{InventoryView, QueryLimits, QuerySpec, SortKey};
use crate::inventory::repository::RepositoryError;
use crate::inventory::store::InMemoryPropertyStore;
use crate::valuation::{Bedrooms, PropertyType};

fn engine_over(properties: Vec<crate::inventory::Property>) -> InventoryQueryEngine<InMemoryPropertyStore> {
    InventoryQueryEngine::new(Arc::new(InMemoryPropertyStore::with_properties(properties)))
}

fn listings() -> QuerySpec {
    QuerySpec::listings(&QueryLimits::default())
}

#[test]
fn pages_past_the_end_are_empty_with_correct_metadata() {
    let engine = engine_over((1..=100).map(listing).collect());

    let fifth = engine.resolve(&listings().with_page(5, 24)).expect("page 5");
    assert_eq!(fifth.total, 100);
    assert_eq!(fifth.pages, 5);
    assert_eq!(fifth.items.len(), 4);
    assert!(!fifth.has_next);
    assert!(fifth.has_prev);

    let sixth = engine.resolve(&listings().with_page(6, 24)).expect("page 6");
    assert!(sixth.items.is_empty());
    assert_eq!(sixth.total, 100);
    assert_eq!(sixth.pages, 5);
    assert!(!sixth.has_next);
}

#[test]
fn consecutive_pages_cover_every_match_once() {
    let mut properties: Vec<_> = (1..=30).map(listing).collect();
    // Shared timestamps force the id tie-break.
    for property in properties.iter_mut().filter(|property| property.id.0 % 3 == 0) {
        property.created_at = epoch();
    }
    let engine = engine_over(properties);

    let mut seen = Vec::new();
    for page in 1..=4 {
        let result = engine.resolve(&listings().with_page(page, 8)).expect("page");
        seen.extend(ids(&result.items));
    }

    let mut sorted = seen.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(seen.len(), 30);
    assert_eq!(sorted.len(), 30);

    let again: Vec<u64> = (1..=4)
        .flat_map(|page| {
            ids(&engine
                .resolve(&listings().with_page(page, 8))
                .expect("page")
                .items)
        })
        .collect();
    assert_eq!(seen, again);
}

#[test]
fn newest_first_breaks_ties_by_id() {
    let mut first = listing(7);
    let mut second = listing(3);
    let newest = listing(5);
    first.created_at = epoch();
    second.created_at = epoch();
    let engine = engine_over(vec![first, second, newest]);

    let page = engine.resolve(&listings()).expect("page");
    assert_eq!(ids(&page.items), vec![5, 3, 7]);
}

#[test]
fn price_sorts_break_ties_by_id() {
    let mut properties: Vec<_> = (1..=4).map(listing).collect();
    properties[0].price = 300.0;
    properties[1].price = 100.0;
    properties[2].price = 300.0;
    properties[3].price = 200.0;
    let engine = engine_over(properties);

    let mut spec = listings();
    spec.sort = SortKey::PriceAsc;
    assert_eq!(ids(&engine.resolve(&spec).expect("page").items), vec![2, 4, 1, 3]);

    spec.sort = SortKey::PriceDesc;
    assert_eq!(ids(&engine.resolve(&spec).expect("page").items), vec![1, 3, 4, 2]);
}

#[test]
fn best_value_ranks_deepest_discount_first() {
    let engine = engine_over(vec![
        listing(1),
        valued(2, 130_000.0, 100_000.0),
        valued(3, 40_000.0, 100_000.0),
        valued(4, 100_000.0, 100_000.0),
        valued(5, 25_000.0, 100_000.0),
        valued(6, 95_000.0, 100_000.0),
    ]);

    let mut spec = listings();
    spec.sort = SortKey::BestValue;
    let page = engine.resolve(&spec).expect("page");

    // -75, -60, then fair/overvalued by percentage, unvalued last.
    assert_eq!(ids(&page.items), vec![5, 3, 6, 4, 2, 1]);
}

#[test]
fn filters_compose_with_and() {
    let mut villa = listing(1);
    villa.property_type = PropertyType::VillaPalace;
    villa.bedrooms = Bedrooms::Count(5);
    villa.price = 240_000.0;
    let mut pricey_villa = villa.clone();
    pricey_villa.id = PropertyId(2);
    pricey_villa.price = 900_000.0;
    let mut irbid_villa = villa.clone();
    irbid_villa.id = PropertyId(3);
    irbid_villa.city = "Irbid".to_string();
    let mut small_villa = villa.clone();
    small_villa.id = PropertyId(4);
    small_villa.bedrooms = Bedrooms::Count(3);
    let apartment = listing(5);

    let engine = engine_over(vec![villa, pricey_villa, irbid_villa, small_villa, apartment]);
    let spec = QuerySpec::from_params(
        InventoryView::Listings,
        &params(&[
            ("city", "amman"),
            ("type", "villa"),
            ("max_price", "500000"),
            ("bedrooms", "4+"),
        ]),
        &QueryLimits::default(),
    )
    .expect("valid query");

    let page = engine.resolve(&spec).expect("page");
    assert_eq!(ids(&page.items), vec![1]);
    assert_eq!(page.total, 1);
}

#[test]
fn search_matches_city_and_neighborhood_case_insensitively() {
    let mut abdoun = listing(1);
    abdoun.neighborhood = "Abdoun".to_string();
    abdoun.description = "garden view".to_string();
    let mut irbid = listing(2);
    irbid.city = "Irbid".to_string();
    let engine = engine_over(vec![abdoun, irbid]);

    let mut spec = listings();
    spec.search = Some("ABD".to_string());
    assert_eq!(ids(&engine.resolve(&spec).expect("page").items), vec![1]);

    spec.search = Some("irb".to_string());
    assert_eq!(ids(&engine.resolve(&spec).expect("page").items), vec![2]);

    spec.search = Some("garden".to_string());
    assert!(engine.resolve(&spec).expect("page").items.is_empty());
}

#[test]
fn opportunity_search_also_reads_descriptions() {
    let mut bargain = valued(1, 30_000.0, 100_000.0);
    bargain.description = "Garden floor, needs work".to_string();
    let engine = engine_over(vec![bargain, valued(2, 20_000.0, 100_000.0)]);

    let mut spec = QuerySpec::opportunities(&QueryLimits::default());
    spec.search = Some("garden".to_string());
    assert_eq!(ids(&engine.resolve(&spec).expect("page").items), vec![1]);
}

#[test]
fn opportunities_require_discount_at_least_minimum() {
    let engine = engine_over(vec![
        valued(1, 50_000.0, 100_000.0),
        valued(2, 51_000.0, 100_000.0),
        valued(3, 20_000.0, 100_000.0),
        valued(4, 150_000.0, 100_000.0),
        listing(5),
    ]);

    let page = engine
        .resolve(&QuerySpec::opportunities(&QueryLimits::default()))
        .expect("page");
    assert_eq!(ids(&page.items), vec![3, 1]);

    let mut relaxed = QuerySpec::opportunities(&QueryLimits::default());
    relaxed.filters.min_discount = Some(10.0);
    let page = engine.resolve(&relaxed).expect("page");
    assert_eq!(ids(&page.items), vec![3, 1, 2]);
    assert!(page
        .items
        .iter()
        .all(|property| property.is_undervalued() && property.predicted_price().is_some()));
}

#[test]
fn vanished_listings_shorten_the_page_without_error() {
    let repository = VanishingRepository {
        inner: InMemoryPropertyStore::with_properties((1..=5).map(listing)),
        vanished: vec![PropertyId(4)],
    };
    let engine = InventoryQueryEngine::new(Arc::new(repository));

    let page = engine.resolve(&listings().with_page(1, 3)).expect("page");
    assert_eq!(ids(&page.items), vec![5, 3]);
    assert_eq!(page.total, 5);
}

#[test]
fn repository_outage_is_reported() {
    let engine = InventoryQueryEngine::new(Arc::new(UnavailableRepository));
    let error = engine.resolve(&listings()).expect_err("outage");
    assert!(matches!(error, RepositoryError::Unavailable(_)));
}
