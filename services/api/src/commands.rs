use crate::infra::{format_amount, load_inventory, valuation_engine, Inventory};
use clap::Args;
use rema::config::AppConfig;
use rema::error::AppError;
use rema::inventory::{write_csv_path, QueryLimits, QuerySpec};
use rema::valuation::PredictionResult;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct EstimateArgs {
    #[arg(long)]
    pub(crate) city: Option<String>,
    #[arg(long)]
    pub(crate) neighborhood: Option<String>,
    /// Property type, e.g. apartment, villa, studio
    #[arg(long = "type")]
    pub(crate) property_type: Option<String>,
    /// sale or rent
    #[arg(long)]
    pub(crate) listing: Option<String>,
    /// Area in square meters
    #[arg(long)]
    pub(crate) surface_area: Option<f64>,
    /// Bedroom count or "studio"
    #[arg(long)]
    pub(crate) bedroom: Option<String>,
    #[arg(long)]
    pub(crate) bathroom: Option<u32>,
    #[arg(long)]
    pub(crate) furnishing: Option<String>,
    /// Free-text floor, e.g. "third floor"
    #[arg(long)]
    pub(crate) floor: Option<String>,
    /// Asking price to classify against the estimate
    #[arg(long)]
    pub(crate) listed_price: Option<f64>,
}

impl EstimateArgs {
    fn into_payload(self) -> Map<String, Value> {
        let mut payload = Map::new();
        let text = [
            ("city", self.city),
            ("neighborhood", self.neighborhood),
            ("type", self.property_type),
            ("listing", self.listing),
            ("bedroom", self.bedroom),
            ("furnishing", self.furnishing),
            ("floor", self.floor),
        ];
        for (key, value) in text {
            if let Some(value) = value {
                payload.insert(key.to_string(), Value::String(value));
            }
        }

        let numbers = [
            ("surface_area", self.surface_area),
            ("bathroom", self.bathroom.map(f64::from)),
            ("listed_price", self.listed_price),
        ];
        for (key, value) in numbers {
            if let Some(number) = value.and_then(serde_json::Number::from_f64) {
                payload.insert(key.to_string(), Value::Number(number));
            }
        }
        payload
    }
}

#[derive(Args, Debug)]
pub(crate) struct RevalueArgs {
    /// Listing CSV to value
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Write the revalued inventory to this CSV
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct OpportunityArgs {
    /// Listing CSV to rank
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Minimum discount in percent (defaults to 50)
    #[arg(long)]
    pub(crate) min_discount: Option<f64>,
    /// Number of listings to print
    #[arg(long, default_value_t = 10)]
    pub(crate) limit: usize,
}

pub(crate) fn run_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let engine = valuation_engine(&config.valuation)?;

    let result = engine.appraise(&args.into_payload())?;
    render_estimate(&result, &config.inventory.currency);
    Ok(())
}

fn render_estimate(result: &PredictionResult, currency: &str) {
    println!(
        "Estimated price: {} {} (model {})",
        format_amount(result.predicted_price),
        currency,
        result.model_version
    );
    match (result.valuation, result.valuation_percentage) {
        (Some(category), Some(percentage)) => {
            println!("Valuation: {category} ({percentage:+.1}% vs estimate)")
        }
        _ => println!("Valuation: no listed price to compare"),
    }
    println!("Confidence: {:?}", result.confidence);
    if !result.defaulted_fields.is_empty() {
        println!("Defaulted fields: {}", result.defaulted_fields.join(", "));
    }
}

fn open_inventory(input: &Path) -> Result<(AppConfig, Arc<Inventory>), AppError> {
    let config = AppConfig::load()?;
    let engine = valuation_engine(&config.valuation)?;
    let (inventory, summary) = load_inventory(input, engine, &config.inventory)?;
    println!(
        "Loaded {}: {} imported | {} skipped | {} without a valuation",
        input.display(),
        summary.imported,
        summary.skipped,
        summary.unvalued
    );
    Ok((config, inventory))
}

pub(crate) fn run_revalue(args: RevalueArgs) -> Result<(), AppError> {
    let (_, inventory) = open_inventory(&args.input)?;

    let summary = inventory.revalue_all()?;
    println!(
        "Revalued: {} updated | {} cleared | {} failed",
        summary.updated, summary.cleared, summary.failed
    );

    let stats = inventory.stats()?;
    println!(
        "Badges: {} undervalued | {} fair | {} overvalued | {} unclassified",
        stats.undervalued,
        stats.fair,
        stats.overvalued,
        stats.total - stats.valued
    );

    if let Some(output) = args.output {
        let written = write_csv_path(&output, &inventory.all()?)?;
        println!("Wrote {written} listings to {}", output.display());
    }
    Ok(())
}

pub(crate) fn run_opportunities(args: OpportunityArgs) -> Result<(), AppError> {
    let (config, inventory) = open_inventory(&args.input)?;

    let spec = opportunity_query(&args, inventory.limits());

    let page = inventory.list_opportunities(&spec)?;
    if page.items.is_empty() {
        println!("No listings meet the discount threshold");
        return Ok(());
    }

    println!("Top {} of {} opportunities", page.items.len(), page.total);
    for (rank, property) in page.items.iter().enumerate() {
        let neighborhood = if property.neighborhood.is_empty() {
            String::new()
        } else {
            format!(" / {}", property.neighborhood)
        };
        println!(
            "{:>2}. #{} {}{} {} for {} | listed {} vs predicted {} {} ({:+.1}%)",
            rank + 1,
            property.id,
            property.city,
            neighborhood,
            property.property_type,
            property.listing,
            format_amount(property.price),
            format_amount(property.predicted_price().unwrap_or_default()),
            config.inventory.currency,
            property.valuation_percentage().unwrap_or_default()
        );
    }
    Ok(())
}

/// First page of the opportunity view, `limit` listings long.
fn opportunity_query(args: &OpportunityArgs, limits: &QueryLimits) -> QuerySpec {
    let mut spec = QuerySpec::opportunities(limits).with_page(1, args.limit);
    if let Some(min_discount) = args.min_discount {
        spec.filters.min_discount = Some(min_discount);
    }
    spec
}
