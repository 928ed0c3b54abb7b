use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::domain::Property;
use crate::valuation::{Bedrooms, Furnishing, ListingKind, PropertyType};

/// Minimum discount applied by the opportunity view when none is requested.
pub const DEFAULT_MIN_DISCOUNT_PCT: f64 = 50.0;
pub const DEFAULT_PAGE_SIZE: usize = 24;
pub const MAX_PAGE_SIZE: usize = 100;

/// Page size bounds applied when parsing query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl QueryLimits {
    pub fn new(default_page_size: usize, max_page_size: usize) -> Self {
        let max_page_size = max_page_size.max(1);
        Self {
            default_page_size: default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
    }
}

/// A query parameter that could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid query parameter '{parameter}': {message}")]
pub struct InvalidQueryError {
    pub parameter: &'static str,
    pub message: String,
}

impl InvalidQueryError {
    pub fn new(parameter: &'static str, message: impl Into<String>) -> Self {
        Self {
            parameter,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryView {
    Listings,
    Opportunities,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    BestValue,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "newest" | "date_desc" | "latest" => Some(Self::Newest),
            "price_asc" => Some(Self::PriceAsc),
            "price_desc" => Some(Self::PriceDesc),
            "best_value" | "valuation" => Some(Self::BestValue),
            _ => None,
        }
    }
}

/// Bedroom constraint. `Exactly(0)` also matches studios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BedroomFilter {
    Studio,
    Exactly(u32),
    AtLeast(u32),
}

impl BedroomFilter {
    pub fn matches(self, bedrooms: Bedrooms) -> bool {
        let count = bedrooms.effective_count();
        match self {
            Self::Studio => count == 0,
            Self::Exactly(wanted) => count == wanted,
            Self::AtLeast(minimum) => count >= minimum,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BathroomFilter {
    Exactly(u32),
    AtLeast(u32),
}

impl BathroomFilter {
    pub fn matches(self, bathrooms: u32) -> bool {
        match self {
            Self::Exactly(wanted) => bathrooms == wanted,
            Self::AtLeast(minimum) => bathrooms >= minimum,
        }
    }
}

/// Field-level constraints, combined with AND. `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilters {
    pub city: Option<String>,
    pub property_type: Option<PropertyType>,
    pub listing: Option<ListingKind>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub bedrooms: Option<BedroomFilter>,
    pub bathrooms: Option<BathroomFilter>,
    pub furnishing: Option<Furnishing>,
    pub min_discount: Option<f64>,
}

impl PropertyFilters {
    pub fn matches(&self, property: &Property) -> bool {
        if let Some(city) = &self.city {
            if !property.city.trim().eq_ignore_ascii_case(city.trim()) {
                return false;
            }
        }
        if self.property_type.is_some_and(|wanted| wanted != property.property_type) {
            return false;
        }
        if self.listing.is_some_and(|wanted| wanted != property.listing) {
            return false;
        }
        if self.min_price.is_some_and(|minimum| property.price < minimum) {
            return false;
        }
        if self.max_price.is_some_and(|maximum| property.price > maximum) {
            return false;
        }
        if self.bedrooms.is_some_and(|filter| !filter.matches(property.bedrooms)) {
            return false;
        }
        if self.bathrooms.is_some_and(|filter| !filter.matches(property.bathrooms)) {
            return false;
        }
        if self.furnishing.is_some_and(|wanted| wanted != property.furnishing) {
            return false;
        }
        if let Some(min_discount) = self.min_discount {
            let discount = property
                .valuation
                .as_ref()
                .and_then(|valuation| valuation.assessment)
                .filter(|assessment| assessment.is_undervalued())
                .map(|assessment| assessment.magnitude());
            if !discount.is_some_and(|discount| discount >= min_discount) {
                return false;
            }
        }
        true
    }
}

/// One inventory query, built per request.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub view: InventoryView,
    pub search: Option<String>,
    pub filters: PropertyFilters,
    pub sort: SortKey,
    pub page: usize,
    pub page_size: usize,
}

impl QuerySpec {
    pub fn listings(limits: &QueryLimits) -> Self {
        Self {
            view: InventoryView::Listings,
            search: None,
            filters: PropertyFilters::default(),
            sort: SortKey::Newest,
            page: 1,
            page_size: limits.default_page_size,
        }
    }

    pub fn opportunities(limits: &QueryLimits) -> Self {
        Self::listings(limits).into_opportunities()
    }

    /// Restricts the query to undervalued listings ranked by discount.
    pub fn into_opportunities(mut self) -> Self {
        self.view = InventoryView::Opportunities;
        self.sort = SortKey::BestValue;
        if self.filters.min_discount.is_none() {
            self.filters.min_discount = Some(DEFAULT_MIN_DISCOUNT_PCT);
        }
        self
    }

    pub fn with_page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Builds a query from URL parameters.
    ///
    /// Unknown keys and unknown sort values are ignored. Malformed numbers,
    /// unrecognized enum values, and out-of-range paging are rejected.
    pub fn from_params(
        view: InventoryView,
        params: &BTreeMap<String, String>,
        limits: &QueryLimits,
    ) -> Result<Self, InvalidQueryError> {
        let mut spec = Self::listings(limits);
        spec.view = view;

        for (key, raw) in params {
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }

            match key.trim().to_ascii_lowercase().as_str() {
                "search" | "q" => spec.search = Some(value.to_string()),
                "city" => spec.filters.city = Some(value.to_string()),
                "type" | "property_type" => {
                    spec.filters.property_type = Some(
                        PropertyType::parse(value)
                            .ok_or_else(|| unknown_value("type", value))?,
                    )
                }
                "listing" => {
                    spec.filters.listing = Some(
                        ListingKind::parse(value).ok_or_else(|| unknown_value("listing", value))?,
                    )
                }
                "furnishing" => {
                    spec.filters.furnishing = Some(
                        Furnishing::parse(value)
                            .ok_or_else(|| unknown_value("furnishing", value))?,
                    )
                }
                "min_price" => spec.filters.min_price = Some(parse_amount("min_price", value)?),
                "max_price" => spec.filters.max_price = Some(parse_amount("max_price", value)?),
                "bedrooms" | "bedroom" => spec.filters.bedrooms = Some(parse_bedrooms(value)?),
                "bathrooms" | "bathroom" => spec.filters.bathrooms = Some(parse_bathrooms(value)?),
                "min_discount" if view == InventoryView::Opportunities => {
                    spec.filters.min_discount = Some(parse_amount("min_discount", value)?)
                }
                "sort" if view == InventoryView::Opportunities => {
                    debug!(sort = value, "opportunity view ignores sort parameter");
                }
                "sort" => match SortKey::parse(value) {
                    Some(sort) => spec.sort = sort,
                    None => debug!(sort = value, "ignoring unknown sort value"),
                },
                "page" => spec.page = parse_page(value)?,
                "page_size" | "limit" => spec.page_size = parse_page_size(value, limits)?,
                other => debug!(parameter = other, "ignoring unknown query parameter"),
            }
        }

        if let (Some(minimum), Some(maximum)) = (spec.filters.min_price, spec.filters.max_price) {
            if minimum > maximum {
                return Err(InvalidQueryError::new(
                    "min_price",
                    "must not exceed max_price",
                ));
            }
        }

        Ok(match view {
            InventoryView::Listings => spec,
            InventoryView::Opportunities => spec.into_opportunities(),
        })
    }

    /// Text search plus structured filters.
    pub fn matches(&self, property: &Property) -> bool {
        self.matches_search(property) && self.filters.matches(property)
    }

    fn matches_search(&self, property: &Property) -> bool {
        let Some(search) = self.search.as_deref() else {
            return true;
        };
        let needle = search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);
        contains(&property.city)
            || contains(&property.neighborhood)
            || (self.view == InventoryView::Opportunities && contains(&property.description))
    }
}

fn unknown_value(parameter: &'static str, value: &str) -> InvalidQueryError {
    InvalidQueryError::new(parameter, format!("unrecognized value '{value}'"))
}

fn parse_amount(parameter: &'static str, value: &str) -> Result<f64, InvalidQueryError> {
    let amount = value
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| InvalidQueryError::new(parameter, format!("'{value}' is not a number")))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(InvalidQueryError::new(
            parameter,
            "must be a non-negative number",
        ));
    }
    Ok(amount)
}

fn parse_count(parameter: &'static str, value: &str) -> Result<u32, InvalidQueryError> {
    let number = value
        .parse::<f64>()
        .map_err(|_| InvalidQueryError::new(parameter, format!("'{value}' is not a count")))?;
    if !number.is_finite() || number < 0.0 || number.fract() != 0.0 || number > f64::from(u32::MAX)
    {
        return Err(InvalidQueryError::new(parameter, "must be a whole non-negative number"));
    }
    Ok(number as u32)
}

fn parse_bedrooms(value: &str) -> Result<BedroomFilter, InvalidQueryError> {
    if value.eq_ignore_ascii_case("studio") {
        return Ok(BedroomFilter::Studio);
    }
    match value.strip_suffix('+') {
        Some(minimum) => Ok(BedroomFilter::AtLeast(parse_count("bedrooms", minimum.trim())?)),
        None => Ok(BedroomFilter::Exactly(parse_count("bedrooms", value)?)),
    }
}

fn parse_bathrooms(value: &str) -> Result<BathroomFilter, InvalidQueryError> {
    match value.strip_suffix('+') {
        Some(minimum) => Ok(BathroomFilter::AtLeast(parse_count("bathrooms", minimum.trim())?)),
        None => Ok(BathroomFilter::Exactly(parse_count("bathrooms", value)?)),
    }
}

fn parse_page(value: &str) -> Result<usize, InvalidQueryError> {
    match value.parse::<i64>() {
        Ok(page) if page >= 1 => usize::try_from(page)
            .map_err(|_| InvalidQueryError::new("page", "is too large")),
        Ok(_) => Err(InvalidQueryError::new("page", "must be at least 1")),
        Err(_) => Err(InvalidQueryError::new("page", format!("'{value}' is not a page number"))),
    }
}

fn parse_page_size(value: &str, limits: &QueryLimits) -> Result<usize, InvalidQueryError> {
    match value.parse::<i64>() {
        Ok(size) if size < 1 => Err(InvalidQueryError::new("page_size", "must be at least 1")),
        Ok(size) if size as u64 > limits.max_page_size as u64 => Err(InvalidQueryError::new(
            "page_size",
            format!("must not exceed {}", limits.max_page_size),
        )),
        Ok(size) => Ok(size as usize),
        Err(_) => Err(InvalidQueryError::new(
            "page_size",
            format!("'{value}' is not a page size"),
        )),
    }
}

/// Result envelope for one page of an ordered query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    /// `pages` is never below one, so an empty result reports page 1 of 1.
    pub fn new(items: Vec<T>, total: usize, page: usize, page_size: usize) -> Self {
        let pages = if page_size == 0 {
            1
        } else {
            total.div_ceil(page_size).max(1)
        };

        Self {
            items,
            total,
            page,
            page_size,
            pages,
            has_next: page < pages,
            has_prev: page > 1,
        }
    }

    /// Same page metadata over borrowed items, e.g. wire views.
    pub fn map_ref<'a, U>(&'a self, f: impl FnMut(&'a T) -> U) -> Page<U> {
        Page {
            items: self.items.iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            pages: self.pages,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}
