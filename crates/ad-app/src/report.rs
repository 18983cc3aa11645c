//! Plain-text rendering of the dashboard

use ad_core::events::events::{FileFailed, FileLoaded, FileUploading};
use ad_core::events::EventBus;
use ad_core::presets::PresetManager;
use ad_core::state::DataFile;
use ad_views::DashboardView;

/// Print one line per upload event as files resolve
pub fn watch_uploads(bus: &EventBus) {
    bus.on(|event: &FileUploading| println!("{}", uploading_line(event)));
    bus.on(|event: &FileLoaded| println!("{}", loaded_line(event)));
    bus.on(|event: &FileFailed| println!("{}", failed_line(event)));
}

fn uploading_line(event: &FileUploading) -> String {
    format!("  [....]  {}", event.source)
}

fn loaded_line(event: &FileLoaded) -> String {
    format!(
        "  [done]  {} ({} rows, {} columns)",
        event.file_name, event.row_count, event.column_count
    )
}

fn failed_line(event: &FileFailed) -> String {
    format!("  [error] {}: {}", event.source, event.error)
}

pub fn print_presets(presets: &PresetManager) {
    if presets.is_empty() {
        println!("No saved presets");
        return;
    }
    for preset in presets.all() {
        let filters: Vec<String> = preset.filters.iter().map(|(k, v)| format!("{k}={v}")).collect();
        println!(
            "{}  {}  [{}]  search: {:?}",
            preset.created_at.format("%Y-%m-%d %H:%M"),
            preset.name,
            filters.join(", "),
            preset.search_term,
        );
    }
}

pub fn print_dashboard(file: &DataFile, view: &DashboardView) {
    let stats = &view.stats;
    println!();
    println!("{}", file.name);
    println!("  Total rows:     {}", stats.total_rows);
    println!("  Filtered rows:  {}", stats.filtered_count);
    println!("  Unique groups:  {}", stats.unique_groups);
    match &stats.sum_column {
        Some(column) => println!("  Total {column}: {}", stats.total_sum),
        None => println!("  Total:          {}", stats.total_sum),
    }

    if let Some(chart) = &view.chart {
        println!();
        println!("{} ({} chart)", chart.title, chart.chart_type.as_str());
        let width = chart.points.iter().map(|p| p.name.chars().count()).max().unwrap_or(0);
        for point in &chart.points {
            println!("  {:<width$}  {}", point.name, point.value);
        }
        if chart.is_truncated() {
            println!("  ... {} more not shown", chart.total_points - chart.points.len());
        }
    }

    let table = &view.table;
    println!();
    println!("{}", table.columns.join(" | "));
    for row in 0..table.shown() {
        let cells: Vec<String> = table.columns.iter().map(|c| table.cell(row, c)).collect();
        println!("{}", cells.join(" | "));
    }
    println!("Showing {} of {} rows", table.shown(), table.total_rows);
}
