use std::thread;

use crate::catalog::CatalogIndex;
use crate::coerce::coerce_number;
use crate::config::ColumnSelection;
use crate::error::VolumeError;
use crate::model::{MatchKind, Resolution, ResolvedRow, ResultSet, Table, WarehouseRow};

/// Pull `(name, quantity)` pairs out of a warehouse table by column position.
///
/// Column positions are checked against the table width first. Names are taken
/// as displayed (numbers included); quantities go through the numeric
/// default-on-parse-failure rule.
pub fn warehouse_rows(
    table: &Table,
    columns: &ColumnSelection,
) -> Result<Vec<WarehouseRow>, VolumeError> {
    columns.validate_against(table.column_count())?;
    let name_idx = columns.name_index();
    let qty_idx = columns.quantity_index();

    Ok((0..table.row_count())
        .map(|row| WarehouseRow {
            raw_name: table.cell(row, name_idx).display(),
            quantity: coerce_number(table.cell(row, qty_idx)),
        })
        .collect())
}

/// Resolve one row. Blank names (after trimming) skip the lookup entirely.
pub fn resolve_row(row: &WarehouseRow, index: &CatalogIndex) -> ResolvedRow {
    let name = row.raw_name.trim();
    let resolution = if name.is_empty() {
        Resolution::blank()
    } else {
        index.lookup(name)
    };

    ResolvedRow {
        raw_name: row.raw_name.clone(),
        quantity: row.quantity,
        unit_volume: resolution.unit_volume,
        total_volume: resolution.unit_volume.unwrap_or(0.0) * row.quantity,
        kind: resolution.kind,
        score: resolution.score,
    }
}

/// Sequential reconciliation: rows out in the same order they came in.
pub fn reconcile(rows: &[WarehouseRow], index: &CatalogIndex) -> ResultSet {
    ResultSet::new(rows.iter().map(|r| resolve_row(r, index)).collect())
}

/// Reconcile over a fixed pool of `workers` threads.
///
/// Rows are split into contiguous chunks, one per worker; each worker fills
/// its own buffer and the buffers are concatenated in chunk order, so the
/// result is identical to [`reconcile`]. A failed worker fails the whole call.
pub fn reconcile_parallel(
    rows: &[WarehouseRow],
    index: &CatalogIndex,
    workers: usize,
) -> Result<ResultSet, VolumeError> {
    let workers = workers.max(1);
    if workers == 1 || rows.len() < 2 {
        return Ok(reconcile(rows, index));
    }
    let resolved = map_chunks(rows, workers, |r| resolve_row(r, index))?;
    Ok(ResultSet::new(resolved))
}

/// Apply `f` to every row on `workers` scoped threads, keeping row order.
fn map_chunks<T, F>(rows: &[WarehouseRow], workers: usize, f: F) -> Result<Vec<T>, VolumeError>
where
    T: Send,
    F: Fn(&WarehouseRow) -> T + Sync,
{
    let chunk_size = rows.len().div_ceil(workers.max(1)).max(1);
    log::debug!(
        "reconciling {} rows on {workers} workers, chunk size {chunk_size}",
        rows.len()
    );

    let f = &f;
    let partials = thread::scope(|s| {
        let handles: Vec<_> = rows
            .chunks(chunk_size)
            .map(|chunk| s.spawn(move || chunk.iter().map(f).collect::<Vec<_>>()))
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(i, handle)| {
                handle.join().map_err(|panic| {
                    VolumeError::Worker(format!("worker {i} panicked: {}", panic_message(&*panic)))
                })
            })
            .collect::<Vec<_>>()
    });

    let mut out = Vec::with_capacity(rows.len());
    for partial in partials {
        out.extend(partial?);
    }
    Ok(out)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Count of rows that had a name but found no acceptable catalog match.
pub fn unresolved_count(result: &ResultSet) -> usize {
    result
        .rows()
        .iter()
        .filter(|r| r.kind == MatchKind::Unresolved)
        .count()
}
