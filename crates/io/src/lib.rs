// File I/O operations

pub mod csv;
pub mod remote;
pub mod xlsx;

use std::path::Path;

use trf_volume::config::CatalogSource;
use trf_volume::model::Table;

/// Sheet name used when writing Excel output.
pub const OUTPUT_SHEET_NAME: &str = "Sheet1";

/// Supported tabular file formats, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Excel,
}

impl TableFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "txt" => Some(Self::Csv),
            "tsv" | "tab" => Some(Self::Tsv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Load the header row and data rows of a local file.
pub fn load_table(path: &Path, sheet: Option<&str>) -> Result<Table, String> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()));
    }
    match TableFormat::from_path(path) {
        Some(TableFormat::Excel) => xlsx::import(path, sheet),
        Some(TableFormat::Csv) => csv::import(path),
        Some(TableFormat::Tsv) => csv::import_tsv(path),
        None => Err(unsupported(path)),
    }
}

/// Load the catalog table from a local file or a URL.
pub fn load_source(source: &CatalogSource, sheet: Option<&str>) -> Result<Table, String> {
    match source {
        CatalogSource::Path(path) => load_table(path, sheet),
        CatalogSource::Url(url) => remote::fetch_table(url, sheet),
    }
}

/// Write a table in the format named by the file extension.
pub fn save_table(table: &Table, path: &Path) -> Result<(), String> {
    match TableFormat::from_path(path) {
        Some(TableFormat::Excel) => xlsx::export(table, path, OUTPUT_SHEET_NAME),
        Some(TableFormat::Csv) => csv::export(table, path),
        Some(TableFormat::Tsv) => csv::export_tsv(table, path),
        None => Err(unsupported(path)),
    }
}

fn unsupported(path: &Path) -> String {
    format!(
        "Unsupported file type: {} (expected .xlsx, .xls, .xlsm, .xlsb, .ods, .csv or .tsv)",
        path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use trf_volume::model::Cell;

    #[test]
    fn test_format_from_path() {
        assert_eq!(TableFormat::from_path(Path::new("a/b.XLSX")), Some(TableFormat::Excel));
        assert_eq!(TableFormat::from_path(Path::new("b.ods")), Some(TableFormat::Excel));
        assert_eq!(TableFormat::from_path(Path::new("b.csv")), Some(TableFormat::Csv));
        assert_eq!(TableFormat::from_path(Path::new("b.tsv")), Some(TableFormat::Tsv));
        assert_eq!(TableFormat::from_path(Path::new("b.json")), None);
        assert_eq!(TableFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_missing_file() {
        let err = load_table(Path::new("/definitely/not/here.xlsx"), None).unwrap_err();
        assert!(err.starts_with("File not found"), "{err}");
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(load_table(&path, None).unwrap_err().starts_with("Unsupported file type"));
        assert!(save_table(&Table::default(), &path).is_err());
    }

    #[test]
    fn test_save_and_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::new(
            vec!["Product Name".into(), "CBM".into()],
            vec![vec![Cell::text("Widget A"), Cell::Number(0.5)]],
        );

        let xlsx = dir.path().join("catalog.xlsx");
        save_table(&table, &xlsx).unwrap();
        let source = CatalogSource::Path(xlsx);
        assert_eq!(load_source(&source, None).unwrap(), table);

        let csv = dir.path().join("catalog.csv");
        save_table(&table, &csv).unwrap();
        let loaded = load_table(&csv, None).unwrap();
        assert_eq!(loaded.headers, table.headers);
        assert_eq!(loaded.cell(0, 1), &Cell::text("0.5"));
    }
}
