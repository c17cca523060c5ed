// Excel import (calamine) and export (rust_xlsxwriter)

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use rust_xlsxwriter::{Format, Workbook};

use trf_volume::model::{Cell, Table};

/// Excel sheet limits
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

/// Import one sheet of an Excel file (xlsx, xlsm, xls, xlsb, ods).
///
/// `sheet` selects by name; `None` takes the first sheet.
pub fn import(path: &Path, sheet: Option<&str>) -> Result<Table, String> {
    let mut workbook: Sheets<_> =
        open_workbook_auto(path).map_err(|e| format!("Failed to open Excel file: {}", e))?;
    read_sheet(&mut workbook, sheet)
}

/// Same as [`import`] for an in-memory workbook.
pub fn import_from_bytes(bytes: Vec<u8>, sheet: Option<&str>) -> Result<Table, String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| format!("Failed to open Excel data: {}", e))?;
    read_sheet(&mut workbook, sheet)
}

fn read_sheet<RS: Read + Seek>(workbook: &mut Sheets<RS>, sheet: Option<&str>) -> Result<Table, String> {
    let sheet_names = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| {
                format!(
                    "Sheet '{}' not found (available: {})",
                    wanted,
                    sheet_names.join(", ")
                )
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| "Excel file contains no sheets".to_string())?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", name, e))?;

    let table = range_to_table(&range);
    log::debug!(
        "xlsx import: sheet '{}', {} column(s), {} row(s)",
        name,
        table.column_count(),
        table.row_count()
    );
    Ok(table)
}

/// First used row becomes the header; columns keep their position from column A.
fn range_to_table(range: &Range<Data>) -> Table {
    let (_, start_col) = range.start().unwrap_or((0, 0));
    let offset = start_col as usize;

    let mut rows = range.rows().map(|row| {
        let mut cells = vec![Cell::Empty; offset];
        cells.extend(row.iter().map(data_to_cell));
        cells
    });

    let headers = match rows.next() {
        Some(header) => header.iter().map(Cell::display).collect(),
        None => return Table::default(),
    };
    Table::new(headers, rows.collect())
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s.as_str()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::text(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => Cell::text(format!("#{:?}", e)),
        // Serial number in the 1900 date system
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) => Cell::text(s.as_str()),
        Data::DurationIso(s) => Cell::text(s.as_str()),
    }
}

/// Write `table` as a single-sheet workbook: bold header row, numbers as numbers.
pub fn export(table: &Table, path: &Path, sheet_name: &str) -> Result<(), String> {
    let width = table.column_count();
    if table.row_count() + 1 > MAX_ROWS || width > MAX_COLS {
        return Err(format!(
            "Table of {}x{} exceeds the Excel sheet limit of {}x{}",
            table.row_count() + 1,
            width,
            MAX_ROWS,
            MAX_COLS
        ));
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(sheet_name)
        .map_err(|e| format!("Failed to create sheet '{}': {}", sheet_name, e))?;

    let header_format = Format::new().set_bold();
    for (col, header) in table.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &header_format)
            .map_err(|e| format!("Failed to write header: {}", e))?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let target_row = (row_idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    worksheet
                        .write_string(target_row, col, s)
                        .map_err(|e| format!("Failed to write cell: {}", e))?;
                }
                Cell::Number(n) => {
                    worksheet
                        .write_number(target_row, col, *n)
                        .map_err(|e| format!("Failed to write cell: {}", e))?;
                }
            }
        }
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| format!("Failed to freeze header row: {}", e))?;
    worksheet.autofit();

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;
    Ok(())
}
