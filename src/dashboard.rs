//! Dashboard application context.
//!
//! Owns the dataset cache and the boundary document, and turns a cluster
//! selection into everything the presenters need. The table is read once
//! when the dashboard opens and held until an explicit reload; each
//! selection produces its own [`FilterView`] from it without touching disk.

use crate::analysis::{cluster_profiles, radar_series, summarize};
use crate::config::Config;
use crate::data::{filter_records, DatasetCache};
use crate::error::DataLoadError;
use crate::geo::{join_regions, BoundaryDocument};
use crate::models::{
    ClusterPalette, ClusterProfiles, ClusterSelector, DashboardReport, Dataset, MapView,
    RegionRecord, ReportMetadata,
};
use chrono::Utc;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// State of the map view's input.
enum MapSource {
    Disabled,
    Loaded(BoundaryDocument),
    Failed { source: PathBuf, error: String },
}

/// Result of one selection: the filtered rows and their cluster profiles.
#[derive(Debug, Clone)]
pub struct FilterView {
    pub selector: ClusterSelector,
    /// The table the selection was made against.
    pub dataset: Arc<Dataset>,
    /// Rows passing the selection, in source order.
    pub records: Vec<RegionRecord>,
    pub profiles: ClusterProfiles,
}

/// Application context for one data source.
pub struct Dashboard {
    config: Config,
    data_path: PathBuf,
    cache: DatasetCache,
    dataset: RwLock<Arc<Dataset>>,
    map: MapSource,
}

impl Dashboard {
    /// Load the result table and, if `with_map`, the boundary document.
    ///
    /// A table that fails to load aborts here, before the boundary
    /// document is touched. A boundary document that fails to load only
    /// disables the map view.
    pub fn open(config: Config, with_map: bool) -> Result<Self, DataLoadError> {
        let cache = DatasetCache::new(config.load_options());
        Self::with_cache(config, cache, with_map)
    }

    /// Like [`Dashboard::open`] with an existing cache.
    pub fn with_cache(
        config: Config,
        cache: DatasetCache,
        with_map: bool,
    ) -> Result<Self, DataLoadError> {
        let data_path = PathBuf::from(&config.data.path);
        let dataset = cache.get_or_load(&data_path)?;
        if dataset.is_empty() {
            warn!("Result table {} has no rows", data_path.display());
        }
        info!(
            "Result table ready: {} regions in {} clusters",
            dataset.len(),
            dataset.cluster_count()
        );
        debug!("{} tables cached", cache.len());

        let map = if with_map {
            load_map(Path::new(&config.map.geojson))
        } else {
            debug!("Map view disabled");
            MapSource::Disabled
        };

        Ok(Self {
            config,
            data_path,
            cache,
            dataset: RwLock::new(dataset),
            map,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Why the map view cannot render, if it cannot.
    pub fn map_error(&self) -> Option<&str> {
        match &self.map {
            MapSource::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The table selections are made against.
    pub fn dataset(&self) -> Arc<Dataset> {
        let current = self.dataset.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*current)
    }

    /// Read the source file again and make it the current table.
    ///
    /// On failure the table loaded before stays current.
    pub fn reload(&self) -> Result<Arc<Dataset>, DataLoadError> {
        let dataset = self.cache.reload(&self.data_path)?;
        info!("Reloaded {}: {} regions", self.data_path.display(), dataset.len());

        *self.dataset.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&dataset);
        Ok(dataset)
    }

    pub fn palette(&self) -> ClusterPalette {
        self.config.palette()
    }

    /// Apply a selection: filter the table and recompute cluster profiles.
    pub fn on_filter_changed(&self, selector: ClusterSelector) -> FilterView {
        let dataset = self.dataset();

        let selected = filter_records(&dataset.records, selector);
        let profiles = cluster_profiles(selected.iter().copied(), &dataset.indicators);
        let records: Vec<RegionRecord> = selected.into_iter().cloned().collect();

        debug!(
            "Selection {}: {} regions, clusters {:?}",
            selector,
            records.len(),
            profiles.cluster_ids()
        );

        FilterView {
            selector,
            dataset,
            records,
            profiles,
        }
    }

    /// Join the selected regions to the boundary document.
    ///
    /// `None` when the map view is disabled.
    pub fn map_view(&self, view: &FilterView) -> Option<MapView> {
        let key_path = &self.config.map.feature_id_key;
        match &self.map {
            MapSource::Disabled => None,
            MapSource::Failed { source, error } => Some(MapView::failed(
                source.display().to_string(),
                key_path.clone(),
                error.clone(),
            )),
            MapSource::Loaded(document) => {
                let records: Vec<&RegionRecord> = view.records.iter().collect();
                Some(join_regions(&records, document, key_path, &self.palette()))
            }
        }
    }

    /// The boundary document with fill colors for the regions of `map`.
    pub fn colored_geojson(&self, map: &MapView) -> Option<Value> {
        match &self.map {
            MapSource::Loaded(document) if map.is_available() => Some(document.colorize(
                &self.config.map.feature_id_key,
                &map.regions,
                self.config.report.decimals,
            )),
            _ => None,
        }
    }

    /// Assemble the report for a selection.
    pub fn build_report(&self, view: &FilterView, started: Instant) -> DashboardReport {
        let options = self.cache.options();
        let map = self.map_view(view);
        let report_config = &self.config.report;

        let boundary_source = match &self.map {
            MapSource::Disabled => None,
            _ => Some(self.config.map.geojson.clone()),
        };

        DashboardReport {
            metadata: ReportMetadata {
                title: report_config.title.clone(),
                province: report_config.province.clone(),
                data_source: view.dataset.source.display().to_string(),
                boundary_source,
                selector: view.selector,
                generated_at: Utc::now(),
                duration_seconds: started.elapsed().as_secs_f64(),
                decimals: report_config.decimals,
            },
            summary: summarize(&view.dataset, view.records.len()),
            legend: self.config.map.clusters.clone(),
            columns: view.dataset.columns.clone(),
            name_column: options.name_column.clone(),
            cluster_column: options.cluster_column.clone(),
            indicators: view.dataset.indicators.clone(),
            regions: view.records.clone(),
            profiles: view.profiles.clone(),
            radar: radar_series(&view.profiles),
            map,
            interpretation: report_config
                .include_interpretation
                .then(|| interpretation(&report_config.province)),
        }
    }
}

fn load_map(path: &Path) -> MapSource {
    match BoundaryDocument::load(path) {
        Ok(document) => MapSource::Loaded(document),
        Err(e) => {
            error!("Map view unavailable: {}", e);
            MapSource::Failed {
                source: path.to_path_buf(),
                error: e.to_string(),
            }
        }
    }
}

fn interpretation(province: &str) -> String {
    format!(
        "The segmentation shows differences in education quality between the regencies \
         and cities of {}. Clusters with higher indicator values reflect regions with \
         better access to and attainment of education, while clusters with lower values \
         call for prioritized attention and policy intervention. Under Fuzzy C-Means every \
         region holds a degree of membership in each cluster; the label shown is the \
         cluster of highest membership.",
        province
    )
}
