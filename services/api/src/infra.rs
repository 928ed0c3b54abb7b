use metrics_exporter_prometheus::PrometheusHandle;
use rema::config::{InventoryConfig, ValuationConfig};
use rema::error::AppError;
use rema::inventory::{
    ImportSummary, InMemoryPropertyStore, InventoryImporter, InventoryService, InventorySettings,
};
use rema::valuation::{HedonicModel, ValuationEngine, ValuationPolicy};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type Inventory = InventoryService<InMemoryPropertyStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the model artifact. Failure here is fatal for every entry point.
pub(crate) fn valuation_engine(config: &ValuationConfig) -> Result<Arc<ValuationEngine>, AppError> {
    let model = HedonicModel::from_path(&config.model_path)?;
    let engine = ValuationEngine::from_model(model, ValuationPolicy::new(config.threshold_pct));

    info!(
        model_version = engine.model_version(),
        path = %config.model_path.display(),
        threshold_pct = engine.policy().threshold_pct(),
        "price model loaded"
    );
    Ok(Arc::new(engine))
}

/// Fresh in-memory inventory valued from the CSV at `path`.
pub(crate) fn load_inventory(
    path: &Path,
    engine: Arc<ValuationEngine>,
    config: &InventoryConfig,
) -> Result<(Arc<Inventory>, ImportSummary), AppError> {
    let service = InventoryService::new(
        Arc::new(InMemoryPropertyStore::new()),
        engine,
        InventorySettings::from_config(config),
    );
    let summary = InventoryImporter::from_path(path, &service)?;
    Ok((Arc::new(service), summary))
}

/// Whole currency units with thousands separators, e.g. `1,250,000`.
pub(crate) fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
