// CSV/TSV import/export

use std::io::Read;
use std::path::Path;

use trf_volume::model::{Cell, Table};

pub fn import(path: &Path) -> Result<Table, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_str(&content, delimiter)
}

pub fn import_tsv(path: &Path) -> Result<Table, String> {
    let content = read_file_as_utf8(path)?;
    import_from_str(&content, b'\t')
}

/// Parse raw bytes (e.g. a downloaded catalog), sniffing the delimiter
/// unless one is given.
pub fn import_from_bytes(bytes: Vec<u8>, delimiter: Option<u8>) -> Result<Table, String> {
    let content = decode(bytes);
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    import_from_str(&content, delimiter)
}

/// Separators tried when sniffing, in tie-break order.
const DELIMITERS: [u8; 4] = [b'\t', b';', b',', b'|'];
/// Data lines compared against the header when sniffing.
const SNIFF_ROWS: usize = 20;

/// Guess the separator from the header row.
///
/// Catalogs and warehouse exports are read by header name or column position,
/// so the header is what has to split correctly. A candidate must cut it into
/// at least two fields; it then scores by how many sampled data lines keep
/// that width, with the header itself counted twice. Decimal commas in the
/// data never outvote a semicolon header.
fn sniff_delimiter(content: &str) -> u8 {
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());
    let Some(header) = lines.next() else {
        return b',';
    };
    let sample: Vec<&str> = lines.take(SNIFF_ROWS).collect();

    let mut best = (b',', 0usize);
    for delim in DELIMITERS {
        let width = field_count(header, delim);
        if width < 2 {
            continue;
        }
        let agreeing = sample
            .iter()
            .filter(|line| field_count(line, delim) == width)
            .count();
        let score = (agreeing + 2) * width;
        if score > best.1 {
            best = (delim, score);
        }
    }
    best.0
}

/// Fields in one line under `delim`, honouring quotes.
fn field_count(line: &str, delim: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(1, |record| record.len())
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;
    Ok(decode(bytes))
}

fn decode(bytes: Vec<u8>) -> String {
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// First record is the header row; every field stays text.
fn import_from_str(content: &str, delimiter: u8) -> Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(record) => record
            .map_err(|e| e.to_string())?
            .iter()
            .map(str::to_string)
            .collect(),
        None => return Ok(Table::default()),
    };

    let mut rows = Vec::new();
    for result in records {
        let record = result.map_err(|e| e.to_string())?;
        rows.push(record.iter().map(Cell::text).collect());
    }

    log::debug!(
        "csv import: {} column(s), {} row(s), delimiter {:?}",
        headers.len(),
        rows.len(),
        delimiter as char
    );
    Ok(Table::new(headers, rows))
}

pub fn export(table: &Table, path: &Path) -> Result<(), String> {
    export_with_delimiter(table, path, b',')
}

pub fn export_tsv(table: &Table, path: &Path) -> Result<(), String> {
    export_with_delimiter(table, path, b'\t')
}

fn export_with_delimiter(table: &Table, path: &Path, delimiter: u8) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(|e| e.to_string())?;

    writer.write_record(&table.headers).map_err(|e| e.to_string())?;
    for row in &table.rows {
        let record: Vec<String> = row.iter().map(Cell::display).collect();
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}
