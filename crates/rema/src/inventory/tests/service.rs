use std::sync::Arc;

use super::common::*;

use crate::inventory::domain::{PropertyId, PropertyPatch};
use crate::inventory::query::{QueryLimits, QuerySpec};
use crate::inventory::repository::{PropertyRepository, RepositoryError};
use crate::inventory::service::{InventoryServiceError, RevaluationSummary};
use crate::inventory::store::InMemoryPropertyStore;
use crate::valuation::{ListingKind, PropertyType, ValuationCategory};

#[test]
fn create_values_the_listing_and_assigns_an_id() {
    let (service, _) = seeded_service(vec![listing(7)]);

    // 100 m² at 1,000 per m² against an asking price of 80,000.
    let property = service.create(draft("Amman", 100.0, 80_000.0)).expect("create");

    assert_eq!(property.id, PropertyId(8));
    assert_eq!(property.currency, "JOD");
    let valuation = property.valuation.as_ref().expect("valued");
    assert_eq!(valuation.predicted_price, 100_000.0);
    assert_eq!(valuation.model_version, MODEL_VERSION);
    assert_eq!(property.category(), Some(ValuationCategory::Undervalued));
    assert_eq!(property.valuation_percentage(), Some(-20.0));
}

#[test]
fn free_listings_get_a_prediction_but_no_badge() {
    let (service, _) = seeded_service(Vec::new());
    let property = service.create(draft("Amman", 100.0, 0.0)).expect("create");

    assert_eq!(property.predicted_price(), Some(100_000.0));
    assert!(property.category().is_none());
    assert!(property.valuation_percentage().is_none());
}

#[test]
fn unpriceable_listings_are_stored_without_valuation() {
    let (service, _) = seeded_service(Vec::new());
    let property = service
        .create(draft(UNPRICED_CITY, 100.0, 50_000.0))
        .expect("create");

    assert!(property.valuation.is_none());
    assert!(property.category().is_none());
}

#[test]
fn invalid_drafts_are_rejected_with_every_field() {
    let (service, _) = seeded_service(Vec::new());
    let error = service
        .create(draft(" ", 0.0, -1.0))
        .expect_err("invalid draft");

    match error {
        InventoryServiceError::Validation(validation) => {
            assert_eq!(validation.field_names(), vec!["city", "surface_area", "price"]);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn duplicate_explicit_ids_conflict() {
    let (service, _) = seeded_service(vec![listing(3)]);
    let mut duplicate = draft("Amman", 100.0, 90_000.0);
    duplicate.id = Some(PropertyId(3));

    let error = service.create(duplicate).expect_err("conflict");
    assert!(matches!(
        error,
        InventoryServiceError::Repository(RepositoryError::Conflict)
    ));
}

#[test]
fn price_changes_recompute_the_valuation() {
    let (service, store) = seeded_service(Vec::new());
    let created = service.create(draft("Amman", 100.0, 95_000.0)).expect("create");
    assert_eq!(created.category(), Some(ValuationCategory::Fair));

    let updated = service
        .update(
            created.id,
            PropertyPatch {
                price: Some(150_000.0),
                ..PropertyPatch::default()
            },
        )
        .expect("update");

    assert_eq!(updated.category(), Some(ValuationCategory::Overvalued));
    assert_eq!(updated.valuation_percentage(), Some(50.0));
    let stored = store.fetch(created.id).expect("fetch").expect("present");
    assert_eq!(stored, updated);
}

#[test]
fn feature_changes_recompute_the_prediction() {
    let (service, _) = seeded_service(Vec::new());
    let created = service.create(draft("Amman", 100.0, 95_000.0)).expect("create");

    let updated = service
        .update(
            created.id,
            PropertyPatch {
                surface_area: Some(200.0),
                ..PropertyPatch::default()
            },
        )
        .expect("update");
    assert_eq!(updated.predicted_price(), Some(200_000.0));
    assert_eq!(updated.category(), Some(ValuationCategory::Undervalued));
}

#[test]
fn only_price_and_model_inputs_affect_valuation() {
    let cosmetic = PropertyPatch {
        description: Some("Repainted".to_string()),
        images: Some(vec!["new.jpg".to_string()]),
        ..PropertyPatch::default()
    };
    assert!(!cosmetic.affects_valuation());

    let relocation = PropertyPatch {
        neighborhood: Some("Sweifieh".to_string()),
        ..PropertyPatch::default()
    };
    assert!(relocation.affects_valuation());
}

#[test]
fn updates_keep_records_valid() {
    let (service, _) = seeded_service(vec![listing(1)]);
    let error = service
        .update(
            PropertyId(1),
            PropertyPatch {
                surface_area: Some(-5.0),
                ..PropertyPatch::default()
            },
        )
        .expect_err("negative area");
    assert!(matches!(error, InventoryServiceError::Validation(_)));

    let missing = service
        .update(PropertyId(9), PropertyPatch::default())
        .expect_err("unknown id");
    assert!(matches!(
        missing,
        InventoryServiceError::Repository(RepositoryError::NotFound)
    ));
}

#[test]
fn deletes_are_immediate() {
    let (service, _) = seeded_service(vec![listing(1), listing(2)]);

    service.delete(PropertyId(1)).expect("delete");
    assert!(matches!(
        service.get(PropertyId(1)),
        Err(InventoryServiceError::Repository(RepositoryError::NotFound))
    ));
    assert!(matches!(
        service.delete(PropertyId(1)),
        Err(InventoryServiceError::Repository(RepositoryError::NotFound))
    ));
    assert_eq!(service.stats().expect("stats").total, 1);
}

#[test]
fn similar_prefers_same_type_and_closest_price() {
    let source = listing(1);
    let mut close = listing(2);
    close.price = 104_000.0;
    let mut closer = listing(3);
    closer.price = 99_000.0;
    let mut far = listing(4);
    far.price = 160_000.0;
    let mut other_city = listing(5);
    other_city.city = "Irbid".to_string();
    let mut villa = listing(6);
    villa.property_type = PropertyType::VillaPalace;
    villa.price = 100_000.0;
    let mut tie = listing(7);
    tie.price = 96_000.0;

    let (service, _) = seeded_service(vec![source, close, closer, far, other_city, villa, tie]);

    let similar = service.similar(PropertyId(1), 3).expect("similar");
    assert_eq!(ids(&similar), vec![3, 2, 7]);

    // Four candidate apartments cannot fill five slots, so other types join.
    let widened = service.similar(PropertyId(1), 5).expect("similar");
    assert_eq!(ids(&widened), vec![6, 3, 2, 7]);
}

#[test]
fn similar_validates_limit_and_source() {
    let (service, _) = seeded_service(vec![listing(1)]);

    for limit in [0, 11] {
        assert!(matches!(
            service.similar(PropertyId(1), limit),
            Err(InventoryServiceError::InvalidQuery(_))
        ));
    }
    assert!(matches!(
        service.similar(PropertyId(2), 3),
        Err(InventoryServiceError::Repository(RepositoryError::NotFound))
    ));
    assert!(service.similar(PropertyId(1), 3).expect("similar").is_empty());
}

#[test]
fn compare_picks_lowest_price_per_square_meter() {
    let mut roomy = listing(1);
    roomy.surface_area = 200.0;
    roomy.price = 150_000.0;
    let mut compact = listing(2);
    compact.surface_area = 80.0;
    compact.price = 90_000.0;
    let mut free = listing(3);
    free.price = 0.0;
    let (service, _) = seeded_service(vec![roomy, compact, free]);

    let comparison = service
        .compare(&[PropertyId(2), PropertyId(1), PropertyId(3)])
        .expect("compare");

    assert_eq!(comparison.entries.len(), 3);
    assert_eq!(comparison.entries[0].price_per_sqm, Some(1_125.0));
    assert_eq!(comparison.entries[1].price_per_sqm, Some(750.0));
    assert_eq!(comparison.entries[2].price_per_sqm, None);
    assert_eq!(comparison.best_value, Some(PropertyId(1)));
}

#[test]
fn compare_needs_two_existing_listings() {
    let (service, _) = seeded_service(vec![listing(1), listing(2)]);

    assert!(matches!(
        service.compare(&[PropertyId(1)]),
        Err(InventoryServiceError::InvalidQuery(_))
    ));
    assert!(matches!(
        service.compare(&[PropertyId(1), PropertyId(9)]),
        Err(InventoryServiceError::InvalidQuery(_))
    ));
    assert!(matches!(
        service.compare(&[PropertyId(1), PropertyId(2), PropertyId(3), PropertyId(4)]),
        Err(InventoryServiceError::InvalidQuery(_))
    ));
}

#[test]
fn compare_counts_repeated_ids_once() {
    let (service, _) = seeded_service((1..=3).map(listing).collect());

    let comparison = service
        .compare(&[PropertyId(1), PropertyId(2), PropertyId(2), PropertyId(3)])
        .expect("three distinct listings");
    let compared: Vec<u64> = comparison
        .entries
        .iter()
        .map(|entry| entry.property.id.0)
        .collect();
    assert_eq!(compared, vec![1, 2, 3]);

    assert!(matches!(
        service.compare(&[PropertyId(1), PropertyId(1)]),
        Err(InventoryServiceError::InvalidQuery(_))
    ));
}

#[test]
fn stats_count_listing_kinds_and_badges() {
    let mut rental = valued(4, 500.0, 480.0);
    rental.listing = ListingKind::Rent;
    let (service, _) = seeded_service(vec![
        valued(1, 50_000.0, 100_000.0),
        valued(2, 150_000.0, 100_000.0),
        listing(3),
        rental,
    ]);

    let stats = service.stats().expect("stats");
    assert_eq!(stats.total, 4);
    assert_eq!(stats.for_sale, 3);
    assert_eq!(stats.for_rent, 1);
    assert_eq!(stats.valued, 3);
    assert_eq!(stats.undervalued, 1);
    assert_eq!(stats.fair, 1);
    assert_eq!(stats.overvalued, 1);
}

#[test]
fn revaluation_is_idempotent() {
    let mut unpriced = valued(3, 90_000.0, 100_000.0);
    unpriced.city = UNPRICED_CITY.to_string();
    let (service, store) = seeded_service(vec![listing(1), valued(2, 1.0, 5.0), unpriced]);

    let first = service.revalue_all().expect("revalue");
    assert_eq!(
        first,
        RevaluationSummary {
            updated: 2,
            cleared: 1,
            failed: 0
        }
    );
    let snapshot = store.scan().expect("scan");

    let second = service.revalue_all().expect("revalue");
    assert_eq!(first, second);
    assert_eq!(store.scan().expect("scan"), snapshot);

    // 120 m² at 1,000 per m².
    let repriced = store.fetch(PropertyId(2)).expect("fetch").expect("present");
    assert_eq!(repriced.predicted_price(), Some(120_000.0));
    assert!(store
        .fetch(PropertyId(3))
        .expect("fetch")
        .expect("present")
        .valuation
        .is_none());
}

#[test]
fn revaluation_counts_listings_deleted_mid_run() {
    let repository = Arc::new(VanishingRepository {
        inner: InMemoryPropertyStore::with_properties((1..=3).map(listing)),
        vanished: vec![PropertyId(2)],
    });
    let service = service_over(repository);

    let summary = service.revalue_all().expect("revalue");
    assert_eq!(summary.updated, 2);
    assert_eq!(summary.failed, 1);
}

#[test]
fn opportunities_ignore_the_requested_view() {
    let (service, _) = seeded_service(vec![
        valued(1, 30_000.0, 100_000.0),
        valued(2, 100_000.0, 100_000.0),
    ]);

    let spec = QuerySpec::listings(&QueryLimits::default());
    let page = service.list_opportunities(&spec).expect("opportunities");
    assert_eq!(ids(&page.items), vec![1]);

    let all = service.list_properties(&spec).expect("listings");
    assert_eq!(all.total, 2);
}

#[test]
fn hand_built_queries_are_checked_for_paging() {
    let (service, _) = seeded_service(vec![listing(1)]);
    let spec = QuerySpec::listings(&QueryLimits::default()).with_page(0, 24);
    assert!(matches!(
        service.list_properties(&spec),
        Err(InventoryServiceError::InvalidQuery(_))
    ));

    let spec = QuerySpec::listings(&QueryLimits::default()).with_page(1, 500);
    assert!(matches!(
        service.list_properties(&spec),
        Err(InventoryServiceError::InvalidQuery(_))
    ));
}
