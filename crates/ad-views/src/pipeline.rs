//! Dashboard pipeline
//!
//! Everything the dashboard shows is a pure function of a dataset and a
//! [`PipelineConfig`]. [`Pipeline`] memoizes that function by content hash so
//! repeated renders with unchanged inputs are free.

use std::sync::Arc;

use ad_core::config::{AnalysisSettings, ChartSettings, DisplayLimits, FilterConfig};
use ad_core::data::{Dataset, DatasetId, Row};
use ad_core::state::DataFile;
use ad_data::cache::{content_hash, DataCache};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{aggregate, AggregationResult};
use crate::filter::{distinct_values, filter_rows};
use crate::plots::{chart_data, ChartData, ChartSource};
use crate::stats::{compute_stats, DashboardStats};
use crate::tables::{visible_rows, TableView};

/// Default number of memoized views
const DEFAULT_CACHE_ENTRIES: usize = 32;

/// Every input to the dashboard computation besides the rows themselves
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PipelineConfig {
    pub settings: AnalysisSettings,
    pub chart: ChartSettings,
    pub filters: FilterConfig,
    pub limits: DisplayLimits,
}

impl PipelineConfig {
    pub fn from_file(file: &DataFile, limits: DisplayLimits) -> Self {
        Self {
            settings: file.settings.clone(),
            chart: file.chart_settings.clone(),
            filters: file.filter_config(),
            limits,
        }
    }
}

/// Derived dashboard state for one dataset and configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    #[serde(skip)]
    pub filtered_rows: Vec<Row>,
    pub aggregation: AggregationResult,
    pub stats: DashboardStats,

    /// Absent until both chart axes are chosen
    pub chart: Option<ChartData>,
    pub table: TableView,

    /// Columns rendered by the table and export
    pub display_columns: Vec<String>,

    /// Dropdown choices per filter column
    pub filter_options: IndexMap<String, Vec<String>>,

    /// Uncapped rows behind the table, as exported
    #[serde(skip)]
    pub visible_rows: Vec<Row>,
}

impl DashboardView {
    /// The visible rows rendered as CSV
    pub fn to_csv(&self) -> String {
        crate::export::export_csv(&self.visible_rows, &self.display_columns)
    }
}

/// Compute the dashboard for `dataset` under `config`.
///
/// Aggregation and the group count always see every row; filters only narrow
/// the raw row view, its chart and the stats derived from it.
pub fn compute(dataset: &Dataset, config: &PipelineConfig) -> DashboardView {
    let rows = &dataset.rows;
    let settings = &config.settings;

    let filtered_rows = filter_rows(rows, &config.filters);
    let aggregation = aggregate(rows, &settings.group_by_column, &settings.sum_columns);
    let stats = compute_stats(rows, &filtered_rows, &aggregation, settings);

    let chart = config.chart.is_complete().then(|| {
        let source = if settings.aggregation_active() {
            ChartSource::Aggregated(&aggregation)
        } else {
            ChartSource::Rows(&filtered_rows)
        };
        chart_data(source, &config.chart, &config.limits)
    });

    let display_columns = settings.resolved_display_columns(&dataset.columns);
    let visible = visible_rows(&filtered_rows, &aggregation, settings);
    let table = TableView::new(display_columns.clone(), visible.clone(), &config.limits);

    let filter_options = settings
        .filter_columns
        .iter()
        .map(|column| (column.clone(), distinct_values(rows, column)))
        .collect();

    DashboardView {
        filtered_rows,
        aggregation,
        stats,
        chart,
        table,
        display_columns,
        filter_options,
        visible_rows: visible,
    }
}

/// Everything a memoized view depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ViewKey {
    dataset: DatasetId,
    rows: usize,
    config: PipelineConfig,
}

/// Cache entry; the key is kept so a hash hit can be confirmed
struct CachedView {
    key: ViewKey,
    view: Arc<DashboardView>,
}

/// Memoizing front for [`compute`]
pub struct Pipeline {
    cache: DataCache<Arc<CachedView>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_ENTRIES)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            cache: DataCache::new(max_entries),
        }
    }

    /// Cached view for `(dataset, config)`, computing it on a miss.
    ///
    /// Datasets are immutable after load, so their id and row count stand in
    /// for their contents.
    pub fn view(&self, dataset: &Dataset, config: &PipelineConfig) -> Arc<DashboardView> {
        let key = ViewKey {
            dataset: dataset.id,
            rows: dataset.row_count(),
            config: config.clone(),
        };
        let hash = content_hash(&key);

        if let Some(entry) = self.cache.get(hash) {
            if entry.key == key {
                return entry.view.clone();
            }
            debug!("View cache hash collision for dataset {}", dataset.id);
        }

        debug!("Computing dashboard view for dataset {}", dataset.id);
        let view = Arc::new(compute(dataset, config));
        self.cache.put(
            hash,
            Arc::new(CachedView {
                key,
                view: view.clone(),
            }),
        );
        view
    }

    /// View for a workspace file with its own settings
    pub fn view_file(&self, file: &DataFile, limits: DisplayLimits) -> Arc<DashboardView> {
        self.view(&file.dataset, &PipelineConfig::from_file(file, limits))
    }

    pub fn cached_views(&self) -> usize {
        self.cache.len()
    }

    pub fn invalidate(&self) {
        self.cache.clear();
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
