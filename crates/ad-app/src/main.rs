//! `analyst`: load spreadsheets, then filter, group, chart and export them

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ad_core::config::{ChartType, DisplayLimits};
use ad_core::presets::PresetManager;
use ad_core::state::{AppSettings, AppState, DataFile, DEFAULT_SAMPLE_ROWS};
use ad_core::store::JsonFileStore;
use ad_data::ingest_batch;
use ad_views::{write_export, write_export_to, Pipeline};

mod report;

#[derive(Parser, Debug)]
#[command(name = "analyst", version, about = "Spreadsheet analysis from the command line")]
struct Args {
    /// Spreadsheets to load (.xlsx, .xls or .csv)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Name of the loaded file to analyse (defaults to the first one loaded)
    #[arg(long)]
    file: Option<String>,

    /// Group rows by this column
    #[arg(long, value_name = "COLUMN", conflicts_with = "no_group")]
    group_by: Option<String>,

    /// Disable grouping
    #[arg(long)]
    no_group: bool,

    /// Columns totalled per group (repeatable, replaces the defaults)
    #[arg(long = "sum", value_name = "COLUMN")]
    sum_columns: Vec<String>,

    /// Columns offering filters and free-text search (repeatable)
    #[arg(long = "filter-col", value_name = "COLUMN")]
    filter_columns: Vec<String>,

    /// Columns shown in the table and export (repeatable)
    #[arg(long = "display", value_name = "COLUMN")]
    display_columns: Vec<String>,

    /// Show raw rows instead of aggregated groups
    #[arg(long)]
    raw: bool,

    /// Equality filter, `COLUMN=VALUE` (repeatable)
    #[arg(long = "filter", value_name = "COLUMN=VALUE", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    /// Free-text search over the filter columns
    #[arg(long)]
    search: Option<String>,

    /// Chart type: bar, pie or line
    #[arg(long)]
    chart: Option<String>,

    /// Chart category column
    #[arg(long = "x", value_name = "COLUMN")]
    x_axis: Option<String>,

    /// Chart value column (`count` plots group sizes)
    #[arg(long = "y", value_name = "COLUMN")]
    y_axis: Option<String>,

    /// Chart title
    #[arg(long)]
    title: Option<String>,

    /// Write the visible table as CSV into a directory or to a file path
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = ".")]
    export: Option<PathBuf>,

    /// Print the dashboard as JSON
    #[arg(long)]
    json: bool,

    /// Key-value store holding saved filter presets
    #[arg(long, value_name = "PATH", default_value = "analyst-store.json")]
    store: PathBuf,

    /// Save the current filters and search under a name
    #[arg(long, value_name = "NAME")]
    save_preset: Option<String>,

    /// Apply a saved preset by name
    #[arg(long, value_name = "NAME")]
    preset: Option<String>,

    /// List saved presets and exit
    #[arg(long)]
    list_presets: bool,

    /// Data rows sampled for column type inference
    #[arg(long, default_value_t = DEFAULT_SAMPLE_ROWS)]
    sample_rows: usize,

    /// Rows shown in the table preview
    #[arg(long)]
    table_rows: Option<usize>,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((column, value)) if !column.is_empty() => Ok((column.to_string(), value.to_string())),
        _ => Err(format!("expected COLUMN=VALUE, got `{raw}`")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list_presets {
        let store = JsonFileStore::open(&args.store)?;
        report::print_presets(&PresetManager::load(&store)?);
        return Ok(());
    }

    let mut limits = DisplayLimits::default();
    if let Some(rows) = args.table_rows {
        limits.table_rows = rows;
    }
    let state = Arc::new(AppState::with_settings(AppSettings {
        sample_rows: args.sample_rows,
        limits,
    }));

    report::watch_uploads(&state.event_bus);
    ingest_batch(&state, args.files.clone()).await;

    if state.file_count() == 0 {
        bail!("no file could be loaded");
    }

    if let Some(name) = &args.file {
        let id = state
            .file_summaries()
            .into_iter()
            .find(|f| &f.name == name)
            .map(|f| f.id)
            .with_context(|| format!("no loaded file named `{name}`"))?;
        state.select_file(id);
    }

    configure(&state, &args)?;

    let file = state
        .with_active_file(DataFile::clone)
        .context("no active file")?;
    info!("Analysing {} ({} rows)", file.name, file.dataset.row_count());

    let view = Pipeline::new().view_file(&file, limits);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&*view)?);
    } else {
        report::print_dashboard(&file, &view);
    }

    if let Some(target) = &args.export {
        let written = if target.is_dir() {
            write_export(target, &file.name, &view.visible_rows, &view.display_columns)?
        } else {
            write_export_to(target, &view.visible_rows, &view.display_columns)?;
            target.clone()
        };
        println!("Exported {} rows to {}", view.visible_rows.len(), written.display());
    }

    Ok(())
}

/// Apply command-line settings and presets to the active file
fn configure(state: &AppState, args: &Args) -> Result<()> {
    let preset = match &args.preset {
        Some(name) => {
            let store = JsonFileStore::open(&args.store)?;
            let presets = PresetManager::load(&store)?;
            let preset = presets
                .find_by_name(name)
                .cloned()
                .with_context(|| format!("no preset named `{name}`"))?;
            Some(preset)
        }
        None => None,
    };

    let filter_config = state.update_active_file(|file| {
        let settings = &mut file.settings;
        if let Some(column) = &args.group_by {
            settings.group_by_column = column.clone();
        }
        if args.no_group {
            settings.group_by_column.clear();
        }
        if !args.sum_columns.is_empty() {
            settings.sum_columns = args.sum_columns.clone();
        }
        if !args.filter_columns.is_empty() {
            settings.filter_columns = args.filter_columns.clone();
        }
        if !args.display_columns.is_empty() {
            settings.display_columns = args.display_columns.clone();
        }
        if args.raw {
            settings.show_aggregated = false;
        }

        let chart = &mut file.chart_settings;
        if let Some(name) = &args.chart {
            chart.chart_type = ChartType::parse_lenient(name);
        }
        if let Some(column) = &args.x_axis {
            chart.x_axis_column = column.clone();
        }
        if let Some(column) = &args.y_axis {
            chart.y_axis_column = column.clone();
        }
        if let Some(title) = &args.title {
            chart.title = title.clone();
        }

        if let Some(preset) = &preset {
            let mut config = file.filter_config();
            preset.apply_to(&mut config);
            file.active_filters = config.equality_filters;
            file.search_term = config.search_term;
        }
        for (column, value) in &args.filters {
            file.set_filter(column.clone(), value.clone());
        }
        if let Some(term) = &args.search {
            file.search_term = term.clone();
        }

        file.filter_config()
    });

    if let (Some(name), Some(config)) = (&args.save_preset, filter_config) {
        let mut store = JsonFileStore::open(&args.store)?;
        let mut presets = PresetManager::load(&store)?;
        presets.create_preset(name.clone(), &config);
        presets.save(&mut store)?;
        println!("Saved preset `{name}` to {}", args.store.display());
    }

    Ok(())
}
