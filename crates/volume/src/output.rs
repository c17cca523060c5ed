use crate::error::VolumeError;
use crate::model::{Cell, ResultSet, Table};

/// Header of the per-unit volume column.
pub const VOLUME_HEADER: &str = "Volume";
/// Header of the per-row total column; the trailer row fills only this one.
pub const TOTAL_VOLUME_HEADER: &str = "Total Volume";

/// Build the output table: every source column, then `Volume` and
/// `Total Volume`, then one trailer row holding the grand total.
///
/// A source header already named `Volume` / `Total Volume` is overwritten in
/// place instead of duplicated. Unresolved rows show a volume of 0.
pub fn render(source: &Table, result: &ResultSet) -> Result<Table, VolumeError> {
    if source.row_count() != result.len() {
        return Err(VolumeError::RowCountMismatch {
            expected: source.row_count(),
            actual: result.len(),
        });
    }

    let mut headers = source.headers.clone();
    headers.resize(source.column_count(), String::new());

    let volume_col = column_for(&mut headers, VOLUME_HEADER);
    let total_col = column_for(&mut headers, TOTAL_VOLUME_HEADER);
    let width = headers.len();

    let mut rows = Vec::with_capacity(source.row_count() + 1);
    for (src, resolved) in source.rows.iter().zip(result.rows()) {
        let mut row = src.clone();
        row.resize(width, Cell::Empty);
        row[volume_col] = Cell::Number(resolved.unit_volume.unwrap_or(0.0));
        row[total_col] = Cell::Number(resolved.total_volume);
        rows.push(row);
    }

    let mut trailer = vec![Cell::Empty; width];
    trailer[total_col] = Cell::Number(result.trailer().total_volume);
    rows.push(trailer);

    Ok(Table::new(headers, rows))
}

fn column_for(headers: &mut Vec<String>, name: &str) -> usize {
    match headers.iter().position(|h| h == name) {
        Some(idx) => idx,
        None => {
            headers.push(name.to_string());
            headers.len() - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogIndex;
    use crate::model::{CatalogEntry, WarehouseRow};
    use crate::reconcile::reconcile;

    fn index() -> CatalogIndex {
        CatalogIndex::build(vec![CatalogEntry::new("Widget A", 0.5)])
    }

    #[test]
    fn appends_columns_and_trailer() {
        let source = Table::new(
            vec!["Order".into(), "Name".into(), "Qty".into()],
            vec![
                vec![Cell::text("o1"), Cell::text("Widget A"), Cell::Number(4.0)],
                vec![Cell::text("o2"), Cell::text("Mystery"), Cell::Number(1.0)],
            ],
        );
        let rows = vec![WarehouseRow::new("Widget A", 4.0), WarehouseRow::new("Mystery", 1.0)];
        let result = reconcile(&rows, &index());
        let out = render(&source, &result).unwrap();

        assert_eq!(out.headers, vec!["Order", "Name", "Qty", "Volume", "Total Volume"]);
        assert_eq!(out.row_count(), 3);
        assert_eq!(out.cell(0, 3), &Cell::Number(0.5));
        assert_eq!(out.cell(0, 4), &Cell::Number(2.0));
        assert_eq!(out.cell(1, 0), &Cell::text("o2"));
        assert_eq!(out.cell(1, 3), &Cell::Number(0.0));
        assert_eq!(out.cell(1, 4), &Cell::Number(0.0));

        let trailer = &out.rows[2];
        assert_eq!(trailer.len(), 5);
        assert!(trailer[..4].iter().all(Cell::is_empty));
        assert_eq!(trailer[4], Cell::Number(2.0));
    }

    #[test]
    fn existing_volume_columns_are_overwritten() {
        let source = Table::new(
            vec!["Name".into(), "Volume".into(), "Qty".into()],
            vec![vec![Cell::text("Widget A"), Cell::text("stale"), Cell::Number(2.0)]],
        );
        let result = reconcile(&[WarehouseRow::new("Widget A", 2.0)], &index());
        let out = render(&source, &result).unwrap();

        assert_eq!(out.headers, vec!["Name", "Volume", "Qty", "Total Volume"]);
        assert_eq!(out.cell(0, 1), &Cell::Number(0.5));
        assert_eq!(out.cell(0, 3), &Cell::Number(1.0));
    }

    #[test]
    fn ragged_source_is_padded() {
        let source = Table::new(
            vec!["Name".into()],
            vec![vec![Cell::text("Widget A"), Cell::Number(3.0)]],
        );
        let result = reconcile(&[WarehouseRow::new("Widget A", 3.0)], &index());
        let out = render(&source, &result).unwrap();
        assert_eq!(out.headers, vec!["Name", "", "Volume", "Total Volume"]);
        assert_eq!(out.cell(0, 1), &Cell::Number(3.0));
        assert_eq!(out.cell(0, 3), &Cell::Number(1.5));
    }

    #[test]
    fn empty_source_gets_only_trailer() {
        let source = Table::new(vec!["Name".into(), "Qty".into()], Vec::new());
        let result = reconcile(&[], &index());
        let out = render(&source, &result).unwrap();
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.cell(0, 3), &Cell::Number(0.0));
    }

    #[test]
    fn row_count_mismatch_is_an_error() {
        let source = Table::new(vec!["Name".into()], vec![vec![Cell::text("x")]]);
        let result = reconcile(&[], &index());
        let err = render(&source, &result).unwrap_err();
        assert_eq!(err, VolumeError::RowCountMismatch { expected: 1, actual: 0 });
    }
}
