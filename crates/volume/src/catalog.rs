use std::collections::HashMap;

use crate::coerce::coerce_number;
use crate::error::VolumeError;
use crate::model::{CatalogEntry, MatchKind, Resolution, Table};
use crate::similarity::{partial_ratio_prepared, Prepared};

/// Header of the catalog column holding product names.
pub const NAME_FIELD: &str = "Product Name";
/// Header of the catalog column holding unit volume (CBM).
pub const VOLUME_FIELD: &str = "CBM";

/// Minimum fuzzy score accepted as a match. Fixed policy, not configurable:
/// a false positive lands directly in shipping totals.
pub const MATCH_THRESHOLD: f64 = 80.0;

/// Read catalog entries from a table with `Product Name` and `CBM` headers.
///
/// Blank names are kept as empty strings so entries stay aligned with source
/// rows. Non-numeric CBM values coerce to 0.0.
pub fn entries_from_table(table: &Table) -> Result<Vec<CatalogEntry>, VolumeError> {
    let name_idx = table.column_index(NAME_FIELD);
    let volume_idx = table.column_index(VOLUME_FIELD);

    let (name_idx, volume_idx) = match (name_idx, volume_idx) {
        (Some(n), Some(v)) => (n, v),
        _ => {
            let missing = [(NAME_FIELD, name_idx), (VOLUME_FIELD, volume_idx)]
                .iter()
                .filter(|(_, idx)| idx.is_none())
                .map(|(field, _)| field.to_string())
                .collect();
            return Err(VolumeError::Schema { missing });
        }
    };

    Ok((0..table.row_count())
        .map(|row| CatalogEntry {
            name: table.cell(row, name_idx).display(),
            unit_volume: coerce_number(table.cell(row, volume_idx)),
        })
        .collect())
}

/// Immutable name-resolution structure over the reference catalog.
///
/// Holds an exact `name -> unit_volume` map (last write wins) and the ordered
/// corpus of every name, duplicates included, for fuzzy scanning.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    volumes: HashMap<String, f64>,
    names: Vec<String>,
    prepared: Vec<Prepared>,
}

impl CatalogIndex {
    pub fn build(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut volumes = HashMap::new();
        let mut names = Vec::new();
        for entry in entries {
            volumes.insert(entry.name.clone(), entry.unit_volume);
            names.push(entry.name);
        }
        let prepared = names.iter().map(|n| Prepared::new(n)).collect();
        log::debug!(
            "catalog index built: {} names, {} distinct",
            names.len(),
            volumes.len()
        );
        Self {
            volumes,
            names,
            prepared,
        }
    }

    /// Build straight from a source table; fails with a schema error when
    /// `Product Name` or `CBM` is absent.
    pub fn from_table(table: &Table) -> Result<Self, VolumeError> {
        Ok(Self::build(entries_from_table(table)?))
    }

    /// Corpus names in original order, duplicates retained.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Unit volume for `query`, or `None` when nothing acceptable matches.
    pub fn resolve(&self, query: &str) -> Option<f64> {
        self.lookup(query).unit_volume
    }

    /// Exact-then-fuzzy lookup with full diagnostics.
    pub fn lookup(&self, query: &str) -> Resolution {
        if query.is_empty() {
            return Resolution::blank();
        }

        if let Some(&volume) = self.volumes.get(query) {
            return Resolution {
                kind: MatchKind::Exact,
                unit_volume: Some(volume),
                candidate: Some(query.to_string()),
                score: None,
            };
        }

        match self.best_candidate(query) {
            Some((idx, score)) => {
                let name = &self.names[idx];
                let accepted = score >= MATCH_THRESHOLD;
                Resolution {
                    kind: if accepted {
                        MatchKind::Fuzzy
                    } else {
                        MatchKind::Unresolved
                    },
                    unit_volume: if accepted {
                        self.volumes.get(name).copied()
                    } else {
                        None
                    },
                    candidate: Some(name.clone()),
                    score: Some(score),
                }
            }
            None => Resolution {
                kind: MatchKind::Unresolved,
                unit_volume: None,
                candidate: None,
                score: None,
            },
        }
    }

    /// Highest-scoring corpus position for `query`. Ties keep the earliest.
    pub fn best_candidate(&self, query: &str) -> Option<(usize, f64)> {
        let query = Prepared::new(query);
        let mut best: Option<(usize, f64)> = None;
        for (idx, name) in self.prepared.iter().enumerate() {
            let score = partial_ratio_prepared(&query, name);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((idx, score));
            }
        }
        best
    }
}
