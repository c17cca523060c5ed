use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum VolumeError {
    /// Catalog table is missing one or more required fields.
    Schema { missing: Vec<String> },
    /// Catalog resource could not be fetched or read.
    SourceUnavailable { source: String, reason: String },
    /// Job settings or column positions are invalid.
    Configuration(String),
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Output rendering was handed a result set built from a different table.
    RowCountMismatch { expected: usize, actual: usize },
    /// A reconciliation worker failed; no partial result is kept.
    Worker(String),
}

impl fmt::Display for VolumeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema { missing } => {
                let quoted: Vec<String> = missing.iter().map(|m| format!("'{m}'")).collect();
                write!(f, "catalog schema error: missing field(s) {}", quoted.join(", "))
            }
            Self::SourceUnavailable { source, reason } => {
                write!(f, "catalog source unavailable: {source}: {reason}")
            }
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::RowCountMismatch { expected, actual } => {
                write!(f, "result has {actual} row(s) but the source table has {expected}")
            }
            Self::Worker(msg) => write!(f, "reconciliation failed: {msg}"),
        }
    }
}

impl std::error::Error for VolumeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_message_lists_every_missing_field() {
        let err = VolumeError::Schema {
            missing: vec!["Product Name".into(), "CBM".into()],
        };
        assert_eq!(
            err.to_string(),
            "catalog schema error: missing field(s) 'Product Name', 'CBM'"
        );
    }

    #[test]
    fn source_unavailable_names_the_source() {
        let err = VolumeError::SourceUnavailable {
            source: "https://example.com/product_info.xlsx".into(),
            reason: "HTTP 404".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("product_info.xlsx"));
        assert!(msg.contains("HTTP 404"));
    }
}
