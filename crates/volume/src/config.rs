use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::VolumeError;

/// Worker pool size used when the job file does not set one.
pub const DEFAULT_WORKERS: usize = 4;

/// Default output file name.
pub const DEFAULT_OUTPUT_FILE: &str = "TRF_volumes_result.xlsx";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub cache: Option<CacheConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Local path (relative to the job file) or http(s) URL.
    pub source: String,
    #[serde(default)]
    pub sheet: Option<String>,
}

/// Where the reference catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Path(PathBuf),
    Url(String),
}

impl CatalogSource {
    /// URLs are kept verbatim; relative paths resolve against `base_dir`.
    pub fn parse(raw: &str, base_dir: &Path) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::Path(resolve_path(base_dir, trimmed))
        }
    }

    /// Stable identity used as the catalog cache key.
    pub fn key(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Url(u) => u.clone(),
        }
    }
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ---------------------------------------------------------------------------
// Warehouse column selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseConfig {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default = "default_name_column")]
    pub name_column: usize,
    #[serde(default = "default_order_column")]
    pub order_column: Option<usize>,
    #[serde(default = "default_quantity_column")]
    pub quantity_column: usize,
}

impl WarehouseConfig {
    pub fn columns(&self) -> ColumnSelection {
        ColumnSelection {
            name_column: self.name_column,
            order_column: self.order_column,
            quantity_column: self.quantity_column,
        }
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        let columns = ColumnSelection::default();
        Self {
            file: None,
            sheet: None,
            name_column: columns.name_column,
            order_column: columns.order_column,
            quantity_column: columns.quantity_column,
        }
    }
}

/// 1-based column positions in the warehouse table, counted from the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSelection {
    pub name_column: usize,
    /// Identified for the caller's benefit only; never read by the reconciler.
    pub order_column: Option<usize>,
    pub quantity_column: usize,
}

fn default_name_column() -> usize {
    4
}

fn default_order_column() -> Option<usize> {
    Some(2)
}

fn default_quantity_column() -> usize {
    5
}

impl Default for ColumnSelection {
    fn default() -> Self {
        Self {
            name_column: default_name_column(),
            order_column: default_order_column(),
            quantity_column: default_quantity_column(),
        }
    }
}

impl ColumnSelection {
    pub fn new(name_column: usize, quantity_column: usize) -> Self {
        Self {
            name_column,
            order_column: None,
            quantity_column,
        }
    }

    pub fn with_order_column(mut self, order_column: usize) -> Self {
        self.order_column = Some(order_column);
        self
    }

    /// Zero-based index of the product-name column.
    pub fn name_index(&self) -> usize {
        self.name_column.saturating_sub(1)
    }

    /// Zero-based index of the quantity column.
    pub fn quantity_index(&self) -> usize {
        self.quantity_column.saturating_sub(1)
    }

    fn positions(&self) -> impl Iterator<Item = (&'static str, usize)> {
        [
            ("name_column", Some(self.name_column)),
            ("order_column", self.order_column),
            ("quantity_column", Some(self.quantity_column)),
        ]
        .into_iter()
        .filter_map(|(label, pos)| pos.map(|p| (label, p)))
    }

    /// Positions must be 1-based; checked without a table.
    pub fn validate(&self) -> Result<(), VolumeError> {
        for (label, pos) in self.positions() {
            if pos == 0 {
                return Err(VolumeError::Configuration(format!(
                    "{label} is 1-based, got 0"
                )));
            }
        }
        Ok(())
    }

    /// Every position must fall inside a table `column_count` columns wide.
    pub fn validate_against(&self, column_count: usize) -> Result<(), VolumeError> {
        self.validate()?;
        for (label, pos) in self.positions() {
            if pos > column_count {
                return Err(VolumeError::Configuration(format!(
                    "{label} {pos} is out of range: table has {column_count} column(s)"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Run, cache, output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_file")]
    pub file: String,
}

fn default_output_file() -> String {
    DEFAULT_OUTPUT_FILE.to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: default_output_file(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl JobConfig {
    pub fn from_toml(input: &str) -> Result<Self, VolumeError> {
        let config: JobConfig =
            toml::from_str(input).map_err(|e| VolumeError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), VolumeError> {
        if self.catalog.source.trim().is_empty() {
            return Err(VolumeError::Configuration(
                "catalog.source must not be empty".into(),
            ));
        }

        if self.run.workers == 0 {
            return Err(VolumeError::Configuration(
                "run.workers must be at least 1".into(),
            ));
        }

        if self.output.file.trim().is_empty() {
            return Err(VolumeError::Configuration(
                "output.file must not be empty".into(),
            ));
        }

        self.warehouse.columns().validate()
    }

    /// Catalog source with relative paths anchored at `base_dir`.
    pub fn catalog_source(&self, base_dir: &Path) -> CatalogSource {
        CatalogSource::parse(&self.catalog.source, base_dir)
    }
}

/// Join `raw` onto `base_dir` unless it is already absolute.
pub fn resolve_path(base_dir: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
name = "TRF weekly"

[catalog]
source = "product_info.xlsx"
sheet = "Products"

[warehouse]
file = "outbound.csv"
name_column = 3
order_column = 1
quantity_column = 6

[run]
workers = 2

[cache]
ttl_secs = 600

[output]
file = "result.csv"
"#;

    #[test]
    fn parse_full_job() {
        let config = JobConfig::from_toml(FULL).unwrap();
        assert_eq!(config.name.as_deref(), Some("TRF weekly"));
        assert_eq!(config.catalog.sheet.as_deref(), Some("Products"));
        assert_eq!(config.warehouse.file.as_deref(), Some("outbound.csv"));
        assert_eq!(config.warehouse.columns().name_column, 3);
        assert_eq!(config.warehouse.columns().order_column, Some(1));
        assert_eq!(config.warehouse.columns().quantity_column, 6);
        assert_eq!(config.run.workers, 2);
        assert_eq!(config.cache.unwrap().ttl_secs, 600);
        assert_eq!(config.output.file, "result.csv");
    }

    #[test]
    fn minimal_job_uses_defaults() {
        let config = JobConfig::from_toml(
            r#"
[catalog]
source = "product_info.xlsx"
"#,
        )
        .unwrap();
        assert!(config.name.is_none());
        assert_eq!(config.warehouse.columns(), ColumnSelection::default());
        assert_eq!(config.warehouse.columns().name_column, 4);
        assert_eq!(config.warehouse.columns().order_column, Some(2));
        assert_eq!(config.warehouse.columns().quantity_column, 5);
        assert_eq!(config.run.workers, DEFAULT_WORKERS);
        assert!(config.cache.is_none());
        assert_eq!(config.output.file, DEFAULT_OUTPUT_FILE);
    }

    #[test]
    fn reject_missing_catalog() {
        let err = JobConfig::from_toml("name = \"x\"").unwrap_err();
        assert!(matches!(err, VolumeError::ConfigParse(_)));
    }

    #[test]
    fn reject_unknown_key() {
        let err = JobConfig::from_toml(
            r#"
[catalog]
source = "a.xlsx"
threshold = 70
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("threshold"));
    }

    #[test]
    fn reject_zero_workers() {
        let err = JobConfig::from_toml(
            r#"
[catalog]
source = "a.xlsx"
[run]
workers = 0
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("run.workers"));
    }

    #[test]
    fn reject_zero_column() {
        let err = JobConfig::from_toml(
            r#"
[catalog]
source = "a.xlsx"
[warehouse]
quantity_column = 0
"#,
        )
        .unwrap_err();
        assert!(matches!(err, VolumeError::Configuration(_)));
        assert!(err.to_string().contains("quantity_column"));
    }

    #[test]
    fn reject_blank_catalog_source() {
        let err = JobConfig::from_toml(
            r#"
[catalog]
source = "  "
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("catalog.source"));
    }

    #[test]
    fn columns_checked_against_table_width() {
        let cols = ColumnSelection::new(4, 5).with_order_column(2);
        assert!(cols.validate_against(5).is_ok());

        let err = cols.validate_against(4).unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: quantity_column 5 is out of range: table has 4 column(s)"
        );

        let cols = ColumnSelection::new(1, 2).with_order_column(9);
        assert!(cols.validate_against(3).unwrap_err().to_string().contains("order_column 9"));
    }

    #[test]
    fn zero_based_indices() {
        let cols = ColumnSelection::new(4, 5);
        assert_eq!(cols.name_index(), 3);
        assert_eq!(cols.quantity_index(), 4);
    }

    #[test]
    fn catalog_source_detects_urls() {
        let base = Path::new("/jobs");
        assert_eq!(
            CatalogSource::parse("https://example.com/product_info.xlsx", base),
            CatalogSource::Url("https://example.com/product_info.xlsx".into())
        );
        assert_eq!(
            CatalogSource::parse("product_info.xlsx", base),
            CatalogSource::Path(PathBuf::from("/jobs/product_info.xlsx"))
        );
        assert_eq!(
            CatalogSource::parse("/data/product_info.csv", base),
            CatalogSource::Path(PathBuf::from("/data/product_info.csv"))
        );
    }
}
