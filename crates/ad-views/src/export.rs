//! CSV export of the visible table

use std::path::{Path, PathBuf};

use ad_core::data::Row;
use tracing::info;

use crate::ViewError;

/// Extensions stripped from a file name before the export suffix is added
const SOURCE_EXTENSIONS: [&str; 3] = [".xlsx", ".xls", ".csv"];

/// Render rows as CSV.
///
/// The header is the column names joined by commas, unquoted. Every data
/// field is stringified (empty for null), has `"` doubled and is wrapped in
/// quotes. Lines are joined by `\n` with no trailing newline.
pub fn export_csv(rows: &[Row], columns: &[String]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(columns.join(","));

    for row in rows {
        let fields: Vec<String> = columns
            .iter()
            .map(|column| format!("\"{}\"", row.text(column).replace('"', "\"\"")))
            .collect();
        lines.push(fields.join(","));
    }

    lines.join("\n")
}

/// `sales.xlsx` becomes `sales-export.csv`
pub fn export_file_name(source_name: &str) -> String {
    let stem = SOURCE_EXTENSIONS
        .iter()
        .find_map(|ext| strip_suffix_ignore_case(source_name, ext))
        .unwrap_or(source_name);
    format!("{stem}-export.csv")
}

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    let (stem, tail) = (name.get(..split)?, name.get(split..)?);
    tail.eq_ignore_ascii_case(suffix).then_some(stem)
}

/// Write an export next to `dir`, named after `source_name`
pub fn write_export(dir: &Path, source_name: &str, rows: &[Row], columns: &[String]) -> Result<PathBuf, ViewError> {
    let path = dir.join(export_file_name(source_name));
    write_export_to(&path, rows, columns)?;
    Ok(path)
}

/// Write an export to an explicit path
pub fn write_export_to(path: &Path, rows: &[Row], columns: &[String]) -> Result<(), ViewError> {
    let csv = export_csv(rows, columns);
    std::fs::write(path, csv)?;
    info!("Exported {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ad_core::data::CellValue;
    use ad_data::normalize::normalize;
    use ad_data::schema::SchemaDetector;
    use ad_data::sources::csv_source::CsvSource;
    use proptest::prelude::*;

    fn row(fields: &[(&str, Option<CellValue>)]) -> Row {
        fields.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    #[test]
    fn test_export_format() {
        let rows = vec![
            row(&[("Name", Some("Say \"hi\"".into())), ("Sales", Some(10.0.into()))]),
            row(&[("Name", None), ("Sales", Some(0.0.into()))]),
        ];
        let columns = vec!["Name".to_string(), "Sales".to_string()];

        assert_eq!(
            export_csv(&rows, &columns),
            "Name,Sales\n\"Say \"\"hi\"\"\",\"10\"\n\"\",\"0\""
        );
    }

    #[test]
    fn test_export_only_listed_columns() {
        let rows = vec![row(&[("A", Some("x".into())), ("B", Some("y".into()))])];
        assert_eq!(export_csv(&rows, &["B".to_string()]), "B\n\"y\"");
        assert_eq!(export_csv(&[], &["A".to_string(), "B".to_string()]), "A,B");
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("sales.xlsx"), "sales-export.csv");
        assert_eq!(export_file_name("Q1.CSV"), "Q1-export.csv");
        assert_eq!(export_file_name("legacy.xls"), "legacy-export.csv");
        assert_eq!(export_file_name("notes"), "notes-export.csv");
    }

    /// Export, re-import through the CSV reader, export again
    fn reexport(csv: &str) -> Result<String, ad_data::DataError> {
        let sheet = CsvSource::decode(csv.as_bytes())?;
        let parsed = normalize(sheet, &SchemaDetector::new())?.dataset;
        Ok(export_csv(&parsed.rows, &parsed.column_names()))
    }

    #[test]
    fn test_round_trip_keeps_numeric_looking_text() {
        let rows = vec![
            row(&[("Zip", Some("007".into())), ("Price", Some("1.50".into()))]),
            row(&[("Zip", Some(" 12".into())), ("Price", Some(2.5.into()))]),
        ];
        let columns = vec!["Zip".to_string(), "Price".to_string()];
        let first = export_csv(&rows, &columns);

        assert_eq!(first, "Zip,Price\n\"007\",\"1.50\"\n\" 12\",\"2.5\"");
        assert_eq!(reexport(&first).unwrap(), first);
    }

    #[test]
    fn test_round_trip_drops_rows_empty_in_every_exported_column() {
        let rows = vec![
            row(&[("A", Some("x".into())), ("B", None)]),
            row(&[("A", Some("y".into())), ("B", Some("z".into()))]),
        ];
        let first = export_csv(&rows, &["B".to_string()]);

        assert_eq!(first, "B\n\"\"\n\"z\"");
        assert_eq!(reexport(&first).unwrap(), "B\n\"z\"");
    }

    fn cell() -> impl Strategy<Value = Option<CellValue>> {
        prop_oneof![
            Just(None),
            "[A-Za-z0-9 .+-]{0,6}".prop_map(|s| Some(CellValue::Text(s))),
            (-1_000_000i64..1_000_000, 0i32..4)
                .prop_map(|(n, scale)| Some(CellValue::Number(n as f64 / 10f64.powi(scale)))),
        ]
    }

    proptest! {
        #[test]
        fn reexport_matches_export_apart_from_empty_rows(
            cells in proptest::collection::vec(proptest::collection::vec(cell(), 3), 0..12),
            columns in proptest::sample::subsequence(vec!["A", "B", "C"], 1..=3),
        ) {
            let rows: Vec<Row> = cells
                .into_iter()
                .map(|values| ["A", "B", "C"].into_iter().zip(values).collect())
                .collect();
            let columns: Vec<String> = columns.into_iter().map(String::from).collect();
            let first = export_csv(&rows, &columns);

            // lines whose every field is empty come back as all-null rows,
            // which normalization drops
            let expected: Vec<&str> = first
                .split('\n')
                .enumerate()
                .filter(|(i, line)| *i == 0 || line.split(',').any(|field| field != "\"\""))
                .map(|(_, line)| line)
                .collect();

            match reexport(&first) {
                Ok(second) => {
                    prop_assert_eq!(second, expected.join("\n"));
                }
                // a header without data lines is not a valid file
                Err(_) => {
                    prop_assert!(rows.is_empty());
                }
            }
        }
    }

    #[test]
    fn test_write_export() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![row(&[("A", Some(1.0.into()))])];
        let path = write_export(dir.path(), "data.csv", &rows, &["A".to_string()]).unwrap();

        assert!(path.ends_with("data-export.csv"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "A\n\"1\"");
    }
}
