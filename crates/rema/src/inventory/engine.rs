use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use super::domain::{Property, PropertyId};
use super::query::{Page, QuerySpec, SortKey};
use super::repository::{PropertyRepository, RepositoryError};
use crate::valuation::ValuationCategory;

/// Resolves search, filter, sort and pagination over the repository.
pub struct InventoryQueryEngine<R> {
    repository: Arc<R>,
}

impl<R> InventoryQueryEngine<R>
where
    R: PropertyRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Matches and orders on a scan, then hydrates only the requested page.
    /// Listings deleted between the two steps are dropped from the page.
    pub fn resolve(&self, spec: &QuerySpec) -> Result<Page<Property>, RepositoryError> {
        let mut matched: Vec<Property> = self
            .repository
            .scan()?
            .into_iter()
            .filter(|property| spec.matches(property))
            .collect();
        sort_properties(&mut matched, spec.sort);

        let total = matched.len();
        let offset = spec.page.saturating_sub(1).saturating_mul(spec.page_size);
        let ids: Vec<PropertyId> = matched
            .iter()
            .skip(offset)
            .take(spec.page_size)
            .map(|property| property.id)
            .collect();

        let items = self.repository.fetch_many(&ids)?;
        if items.len() < ids.len() {
            debug!(
                requested = ids.len(),
                hydrated = items.len(),
                "listings vanished while resolving page"
            );
        }

        Ok(Page::new(items, total, spec.page, spec.page_size))
    }
}

/// Orders listings for `sort`; ties always fall back to ascending id.
pub fn sort_properties(properties: &mut [Property], sort: SortKey) {
    properties.sort_by(|left, right| compare(left, right, sort).then(left.id.cmp(&right.id)));
}

fn compare(left: &Property, right: &Property, sort: SortKey) -> Ordering {
    match sort {
        SortKey::Newest => right.created_at.cmp(&left.created_at),
        SortKey::PriceAsc => left.price.total_cmp(&right.price),
        SortKey::PriceDesc => right.price.total_cmp(&left.price),
        SortKey::BestValue => {
            let (left_tier, left_pct) = value_rank(left);
            let (right_tier, right_pct) = value_rank(right);
            left_tier
                .cmp(&right_tier)
                .then_with(|| left_pct.total_cmp(&right_pct))
        }
    }
}

/// Undervalued first, then other classified listings, then unclassified ones.
fn value_rank(property: &Property) -> (u8, f64) {
    match (property.category(), property.valuation_percentage()) {
        (Some(ValuationCategory::Undervalued), Some(percentage)) => (0, percentage),
        (Some(_), Some(percentage)) => (1, percentage),
        _ => (2, 0.0),
    }
}
