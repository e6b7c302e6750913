//! File readers: delimited text through `csv`, workbooks through `calamine`.
//!
//! Both readers treat the first row as the header and normalise cells into
//! [`Value`]s with the same rules, so a dataset reads the same whether it was
//! exported as CSV or as a spreadsheet.

use anyhow::{bail, Context, Result};
use calamine::{
    open_workbook_auto, open_workbook_auto_from_rs, Data, DataType, Range, Reader, Sheets,
};
use shared::settings::{RegistryConfig, SheetPolicy};
use shared::{Table, Value};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

/// Supported source formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Excel,
}

impl FileKind {
    /// Detect the format from the extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("csv") => Some(FileKind::Csv),
            Some("xlsx" | "xls") => Some(FileKind::Excel),
            _ => None,
        }
    }
}

/// Read one file into `(dataset name, table)` pairs.
///
/// CSV files and first-sheet workbooks yield a single pair named after the
/// file stem; with [`SheetPolicy::AllSheets`] every sheet becomes its own pair.
pub fn read_file(
    path: &Path,
    kind: FileKind,
    cfg: &RegistryConfig,
) -> Result<Vec<(String, Table)>> {
    let stem = dataset_name(path)?;
    match kind {
        FileKind::Csv => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            Ok(vec![(stem, read_csv(BufReader::new(file), cfg)?)])
        }
        FileKind::Excel => read_workbook(path, &stem, cfg),
    }
}

/// Dataset name for a file: its name with the extension stripped
pub fn dataset_name(path: &Path) -> Result<String> {
    match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) if !stem.is_empty() => Ok(stem.to_string()),
        _ => bail!("file name is not valid UTF-8: {}", path.display()),
    }
}

/// Parse delimited text. Rows whose field count differs from the header fail the whole file.
pub fn read_csv<R: Read>(reader: R, cfg: &RegistryConfig) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .context("reading header row")?
        .iter()
        .map(|s| s.to_string())
        .collect();

    if headers.is_empty() {
        bail!("no header row");
    }

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result.context("reading record")?;
        rows.push(record.iter().map(|raw| parse_cell(raw, cfg)).collect());
    }

    Ok(Table::new(normalize_headers(headers), rows)?)
}

fn read_workbook(path: &Path, stem: &str, cfg: &RegistryConfig) -> Result<Vec<(String, Table)>> {
    match open_workbook_auto(path) {
        Ok(mut workbook) => workbook_tables(&mut workbook, stem, cfg),
        Err(err) => {
            // Extension and content can disagree, e.g. an xlsx archive saved as `.xls`.
            let bytes =
                std::fs::read(path).with_context(|| format!("opening {}", path.display()))?;
            let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
                .map_err(|_| err)
                .with_context(|| format!("opening workbook {}", path.display()))?;
            workbook_tables(&mut workbook, stem, cfg)
        }
    }
}

fn workbook_tables<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    stem: &str,
    cfg: &RegistryConfig,
) -> Result<Vec<(String, Table)>> {
    let sheet_names = workbook.sheet_names();
    let Some(first) = sheet_names.first().cloned() else {
        bail!("workbook has no sheets");
    };

    match cfg.sheet_policy {
        SheetPolicy::FirstSheet => {
            let range = workbook
                .worksheet_range(&first)
                .with_context(|| format!("reading sheet `{}`", first))?;
            Ok(vec![(stem.to_string(), range_to_table(&range, cfg)?)])
        }
        SheetPolicy::AllSheets => {
            let mut out = Vec::with_capacity(sheet_names.len());
            for name in sheet_names {
                let range = workbook
                    .worksheet_range(&name)
                    .with_context(|| format!("reading sheet `{}`", name))?;
                let table = range_to_table(&range, cfg)?;
                out.push((name, table));
            }
            Ok(out)
        }
    }
}

fn range_to_table(range: &Range<Data>, cfg: &RegistryConfig) -> Result<Table> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::default());
    };

    let columns = normalize_headers(header.iter().map(|cell| cell.to_string()).collect());
    let body = rows
        .map(|row| row.iter().map(|cell| excel_cell(cell, cfg)).collect())
        .collect();

    Ok(Table::new(columns, body)?)
}

fn excel_cell(cell: &Data, cfg: &RegistryConfig) -> Value {
    match cell {
        Data::Int(i) => Value::Number(*i as f64),
        Data::Float(f) if f.is_finite() => Value::Number(*f),
        Data::Float(_) => Value::Missing,
        Data::String(s) => parse_cell(s, cfg),
        Data::Bool(b) => Value::Text(b.to_string()),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| Value::Text(dt.to_string()))
            .unwrap_or_else(|| Value::Text(cell.to_string())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(_) | Data::Empty => Value::Missing,
    }
}

/// Normalise one raw text cell: blanks and missing-markers become
/// [`Value::Missing`], finite numbers become [`Value::Number`], anything else
/// is kept verbatim as text.
pub fn parse_cell(raw: &str, cfg: &RegistryConfig) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() || cfg.is_missing_marker(trimmed) {
        return Value::Missing;
    }

    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::Number(n),
        _ => Value::Text(raw.to_string()),
    }
}

/// Blank headers become `Unnamed: {index}`; repeats get `.1`, `.2`, ... suffixes.
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut suffixes: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(raw.len());

    for (index, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", index)
        } else {
            name
        };

        let mut candidate = base.clone();
        while taken.contains(&candidate) {
            let n = suffixes.entry(base.clone()).or_insert(0);
            *n += 1;
            candidate = format!("{}.{}", base, n);
        }

        taken.insert(candidate.clone());
        out.push(candidate);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{write_report, write_workbook, Cell};
    use std::path::PathBuf;

    fn cfg() -> RegistryConfig {
        RegistryConfig::default()
    }

    #[test]
    fn detects_kind_from_extension() {
        assert_eq!(FileKind::from_path(Path::new("Geo_Location.csv")), Some(FileKind::Csv));
        assert_eq!(FileKind::from_path(Path::new("Campaigns.XLSX")), Some(FileKind::Excel));
        assert_eq!(FileKind::from_path(Path::new("legacy.xls")), Some(FileKind::Excel));
        assert_eq!(FileKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(FileKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn dataset_name_strips_last_extension_only() {
        let path = PathBuf::from("/data/Devices(2025.01.01-2025.03.26).csv");
        assert_eq!(dataset_name(&path).unwrap(), "Devices(2025.01.01-2025.03.26)");
    }

    #[test]
    fn parse_cell_normalises_numbers_and_markers() {
        let cfg = cfg();
        assert_eq!(parse_cell(" 42 ", &cfg), Value::Number(42.0));
        assert_eq!(parse_cell("0.35", &cfg), Value::Number(0.35));
        assert_eq!(parse_cell("", &cfg), Value::Missing);
        assert_eq!(parse_cell("N/A", &cfg), Value::Missing);
        assert_eq!(parse_cell("inf", &cfg), Value::text("inf"));
        assert_eq!(parse_cell("United States", &cfg), Value::text("United States"));
    }

    #[test]
    fn reads_csv_with_quoted_fields() {
        let data = "country,sessions,note\nIndia,120,\"fast, growing\"\nUnited States,80,\n";
        let table = read_csv(data.as_bytes(), &cfg()).unwrap();

        assert_eq!(table.columns(), &["country", "sessions", "note"]);
        assert_eq!(table.row_count(), 2);
        let first = table.row(0).unwrap();
        assert_eq!(first.text("note"), Some("fast, growing"));
        assert_eq!(table.row(1).unwrap().get("note"), Some(&Value::Missing));
    }

    #[test]
    fn header_only_csv_is_empty_table() {
        let table = read_csv("Date,Clicks,Impressions\n".as_bytes(), &cfg()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 3);
    }

    #[test]
    fn ragged_csv_fails() {
        let data = "a,b\n1,2\n3\n";
        let err = read_csv(data.as_bytes(), &cfg()).unwrap_err();
        assert!(format!("{:#}", err).contains("reading record"));
    }

    #[test]
    fn empty_csv_fails() {
        assert!(read_csv("".as_bytes(), &cfg()).is_err());
    }

    #[test]
    fn blank_and_repeated_headers_are_renamed() {
        let data = "Clicks,,Clicks,Clicks\n1,2,3,4\n";
        let table = read_csv(data.as_bytes(), &cfg()).unwrap();
        assert_eq!(table.columns(), &["Clicks", "Unnamed: 1", "Clicks.1", "Clicks.2"]);
    }

    #[test]
    fn garbage_workbook_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Campaigns.xlsx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();

        assert!(read_file(&path, FileKind::Excel, &cfg()).is_err());
    }

    #[test]
    fn first_sheet_is_keyed_by_file_stem() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Report.xlsx");
        write_report(&path);

        let tables = read_file(&path, FileKind::Excel, &cfg()).unwrap();
        assert_eq!(tables.len(), 1);
        let (name, table) = &tables[0];
        assert_eq!(name, "Report");
        assert_eq!(table.columns(), &["Campaign Name", "Clicks", "CTR", "Cost"]);
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn all_sheets_are_keyed_by_sheet_name() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Report.xlsx");
        write_report(&path);
        let cfg = cfg().with_sheet_policy(SheetPolicy::AllSheets);

        let tables = read_file(&path, FileKind::Excel, &cfg).unwrap();
        let names: Vec<&str> = tables.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["Campaigns", "Devices"]);
        assert_eq!(tables[1].1.row(0).unwrap().number("Clicks"), Some(80.0));
    }

    #[test]
    fn workbook_cells_are_normalised() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Campaigns.xlsx");
        write_report(&path);

        let tables = read_file(&path, FileKind::Excel, &cfg()).unwrap();
        let table = &tables[0].1;

        let brand = table.row(0).unwrap();
        assert_eq!(brand.text("Campaign Name"), Some("Brand"));
        assert_eq!(brand.number("Clicks"), Some(120.0));
        assert_eq!(brand.number("Cost"), Some(40.5));

        let generic = table.row(1).unwrap();
        assert_eq!(generic.get("Clicks"), Some(&Value::Missing));
        assert_eq!(generic.get("CTR"), Some(&Value::Missing));

        assert_eq!(table.row(2).unwrap().text("Cost"), Some("true"));
    }

    #[test]
    fn header_only_sheet_is_empty_table() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Time_series.xlsx");
        write_workbook(
            &path,
            &[("Sheet1", vec![vec![Cell::Text("Date"), Cell::Text("Clicks")]])],
        );

        let tables = read_file(&path, FileKind::Excel, &cfg()).unwrap();
        assert!(tables[0].1.is_empty());
        assert_eq!(tables[0].1.columns(), &["Date", "Clicks"]);
    }

    #[test]
    fn xlsx_content_under_xls_extension_is_read() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Legacy.xls");
        write_report(&path);

        let tables = read_file(&path, FileKind::Excel, &cfg()).unwrap();
        assert_eq!(tables[0].0, "Legacy");
        assert_eq!(tables[0].1.row_count(), 3);
    }
}
