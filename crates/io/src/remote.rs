// HTTP(S) catalog sources

use std::io::Read;
use std::time::Duration;

use trf_volume::model::Table;

use crate::TableFormat;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Catalog downloads larger than this are refused.
pub const MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;

/// Download `url` and parse it as a table. The format comes from the URL path
/// extension, Excel when there is none.
pub fn fetch_table(url: &str, sheet: Option<&str>) -> Result<Table, String> {
    let format = format_from_url(url).unwrap_or(TableFormat::Excel);
    let bytes = fetch_bytes(url)?;
    log::info!("fetched {} byte(s) from {}", bytes.len(), url);

    match format {
        TableFormat::Excel => crate::xlsx::import_from_bytes(bytes, sheet),
        TableFormat::Csv => crate::csv::import_from_bytes(bytes, None),
        TableFormat::Tsv => crate::csv::import_from_bytes(bytes, Some(b'\t')),
    }
}

fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(format!("trf/{}", env!("CARGO_PKG_VERSION")))
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| format!("Request failed: {}", e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("Server returned HTTP {}", status));
    }

    if let Some(len) = response.content_length() {
        if len > MAX_RESPONSE_BYTES {
            return Err(too_large(len));
        }
    }

    let mut bytes = Vec::new();
    response
        .take(MAX_RESPONSE_BYTES + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| format!("Failed to read response: {}", e))?;
    if bytes.len() as u64 > MAX_RESPONSE_BYTES {
        return Err(too_large(bytes.len() as u64));
    }
    Ok(bytes)
}

fn too_large(len: u64) -> String {
    format!(
        "Response of {} bytes exceeds the {} byte limit",
        len, MAX_RESPONSE_BYTES
    )
}

/// Extension of the last path segment, ignoring query string and fragment.
pub fn format_from_url(url: &str) -> Option<TableFormat> {
    let path = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);
    let after_scheme = path.split_once("://").map_or(path, |(_, rest)| rest);
    let (_, path) = after_scheme.split_once('/')?;
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    TableFormat::from_extension(ext)
}
