use serde::Serialize;

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// A single cell as handed over by the I/O layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Text as it would appear in a spreadsheet cell.
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => format_number(*n),
        }
    }
}

/// Integers print without decimals, everything else in shortest round-trip form.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// In-memory table: one header row plus data rows. Rows may be ragged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    /// Widest extent across the header row and every data row.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.len())
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of the first header equal to `name` (exact comparison).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at `(row, col)`, `Cell::Empty` past the end of a ragged row.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }
}

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    pub unit_volume: f64,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, unit_volume: f64) -> Self {
        Self {
            name: name.into(),
            unit_volume,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseRow {
    pub raw_name: String,
    pub quantity: f64,
}

impl WarehouseRow {
    pub fn new(raw_name: impl Into<String>, quantity: f64) -> Self {
        Self {
            raw_name: raw_name.into(),
            quantity,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Name found verbatim in the catalog.
    Exact,
    /// Best fuzzy candidate scored at or above the threshold.
    Fuzzy,
    /// Best fuzzy candidate scored below the threshold (or catalog empty).
    Unresolved,
    /// Name was empty after trimming; no lookup attempted.
    Blank,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Fuzzy => write!(f, "fuzzy"),
            Self::Unresolved => write!(f, "unresolved"),
            Self::Blank => write!(f, "blank"),
        }
    }
}

/// Outcome of a single catalog lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub kind: MatchKind,
    pub unit_volume: Option<f64>,
    /// Corpus name the query resolved to (or the best rejected candidate).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<String>,
    /// Similarity score, present only when a fuzzy scan ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Resolution {
    pub fn blank() -> Self {
        Self {
            kind: MatchKind::Blank,
            unit_volume: None,
            candidate: None,
            score: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRow {
    pub raw_name: String,
    pub quantity: f64,
    pub unit_volume: Option<f64>,
    pub total_volume: f64,
    pub kind: MatchKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

// ---------------------------------------------------------------------------
// Result set
// ---------------------------------------------------------------------------

/// Synthetic final record carrying only the grand total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrailerRecord {
    pub total_volume: f64,
}

/// Resolved rows in input order plus the trailer. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    rows: Vec<ResolvedRow>,
    trailer: TrailerRecord,
}

impl ResultSet {
    /// Sums `total_volume` strictly left to right so repeated runs agree bit for bit.
    pub fn new(rows: Vec<ResolvedRow>) -> Self {
        let total_volume = rows.iter().fold(0.0_f64, |acc, r| acc + r.total_volume);
        Self {
            rows,
            trailer: TrailerRecord { total_volume },
        }
    }

    pub fn rows(&self) -> &[ResolvedRow] {
        &self.rows
    }

    pub fn trailer(&self) -> TrailerRecord {
        self.trailer
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> ResultSummary {
        let mut summary = ResultSummary {
            rows: self.rows.len(),
            total_volume: self.trailer.total_volume,
            ..ResultSummary::default()
        };
        for row in &self.rows {
            match row.kind {
                MatchKind::Exact => summary.exact += 1,
                MatchKind::Fuzzy => summary.fuzzy += 1,
                MatchKind::Unresolved => summary.unresolved += 1,
                MatchKind::Blank => summary.blank += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSummary {
    pub rows: usize,
    pub exact: usize,
    pub fuzzy: usize,
    pub unresolved: usize,
    pub blank: usize,
    pub total_volume: f64,
}
