//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (unspecified)                               |
//! | 2    | CLI usage error (bad args, missing job or input file)     |
//! | 3    | Catalog schema error (`Product Name` / `CBM` missing)     |
//! | 4    | Catalog source unavailable (missing file, HTTP failure)   |
//! | 5    | Job configuration error (parse, column positions)         |
//! | 6    | Output could not be written                               |
//! | 7    | Reconciliation worker failed                              |
//! | 8    | Unresolved rows found with `--strict` (output still written) |

use trf_volume::VolumeError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable job file, missing input file.
pub const EXIT_USAGE: u8 = 2;

/// Catalog table lacks a required field.
pub const EXIT_SCHEMA: u8 = 3;

/// Catalog could not be fetched or read.
pub const EXIT_SOURCE_UNAVAILABLE: u8 = 4;

/// Job file failed to parse or validate, or a column position is out of range.
pub const EXIT_CONFIGURATION: u8 = 5;

/// Result file could not be written.
pub const EXIT_OUTPUT_WRITE: u8 = 6;

/// A worker failed during parallel resolution.
pub const EXIT_WORKER: u8 = 7;

/// `--strict` and at least one non-blank row did not resolve.
pub const EXIT_UNRESOLVED: u8 = 8;

/// Map an engine error to its exit code.
pub fn volume_exit_code(err: &VolumeError) -> u8 {
    match err {
        VolumeError::Schema { .. } => EXIT_SCHEMA,
        VolumeError::SourceUnavailable { .. } => EXIT_SOURCE_UNAVAILABLE,
        VolumeError::Configuration(_) | VolumeError::ConfigParse(_) => EXIT_CONFIGURATION,
        VolumeError::Worker(_) => EXIT_WORKER,
        VolumeError::RowCountMismatch { .. } => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_SCHEMA,
            EXIT_SOURCE_UNAVAILABLE,
            EXIT_CONFIGURATION,
            EXIT_OUTPUT_WRITE,
            EXIT_WORKER,
            EXIT_UNRESOLVED,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn engine_errors_map_to_their_codes() {
        assert_eq!(volume_exit_code(&VolumeError::Schema { missing: vec!["CBM".into()] }), 3);
        assert_eq!(
            volume_exit_code(&VolumeError::SourceUnavailable {
                source: "x".into(),
                reason: "y".into()
            }),
            4
        );
        assert_eq!(volume_exit_code(&VolumeError::ConfigParse("bad".into())), 5);
        assert_eq!(volume_exit_code(&VolumeError::Configuration("bad".into())), 5);
        assert_eq!(volume_exit_code(&VolumeError::Worker("boom".into())), 7);
    }
}
