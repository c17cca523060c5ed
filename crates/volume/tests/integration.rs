use trf_volume::catalog::CatalogIndex;
use trf_volume::config::{ColumnSelection, JobConfig};
use trf_volume::model::{Cell, MatchKind, Table};
use trf_volume::output::render;
use trf_volume::reconcile::{reconcile, reconcile_parallel, warehouse_rows};
use trf_volume::VolumeError;

fn catalog_table() -> Table {
    Table::new(
        vec!["Product Name".into(), "Category".into(), "CBM".into()],
        vec![
            vec![Cell::text("Widget A"), Cell::text("parts"), Cell::Number(0.5)],
            vec![Cell::text("Widget B"), Cell::text("parts"), Cell::Number(1.2)],
            vec![Cell::text("Oak Desk 120"), Cell::text("furniture"), Cell::text("0.84")],
            vec![Cell::Empty, Cell::text("orphan"), Cell::Number(3.0)],
            vec![Cell::text("Filing Cabinet"), Cell::text("furniture"), Cell::text("tbd")],
        ],
    )
}

fn warehouse_table() -> Table {
    // Date | Order | Customer | Product | Qty
    let row = |order: &str, product: Cell, qty: Cell| {
        vec![Cell::text("2026-03-02"), Cell::text(order), Cell::text("ACME"), product, qty]
    };
    Table::new(
        vec![
            "Date".into(),
            "Order No".into(),
            "Customer".into(),
            "Product".into(),
            "Qty".into(),
        ],
        vec![
            row("SO-1", Cell::text("Widget A"), Cell::Number(3.0)),
            row("SO-1", Cell::text("widget a"), Cell::Number(2.0)),
            row("SO-2", Cell::text("Unknown Thing"), Cell::Number(5.0)),
            row("SO-3", Cell::text("  Oak Desk 120  "), Cell::text("10")),
            row("SO-3", Cell::Empty, Cell::Number(7.0)),
            row("SO-4", Cell::text("Oak Desk"), Cell::text("two")),
            row("SO-4", Cell::text("Filing Cabinet"), Cell::Number(4.0)),
        ],
    )
}

#[test]
fn warehouse_file_to_output_table() {
    let index = CatalogIndex::from_table(&catalog_table()).unwrap();
    let source = warehouse_table();
    let columns = ColumnSelection::default();

    let rows = warehouse_rows(&source, &columns).unwrap();
    let result = reconcile_parallel(&rows, &index, 4).unwrap();

    let kinds: Vec<MatchKind> = result.rows().iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            MatchKind::Exact,
            MatchKind::Fuzzy,
            MatchKind::Unresolved,
            MatchKind::Exact,
            MatchKind::Blank,
            MatchKind::Fuzzy,
            MatchKind::Exact,
        ]
    );

    let totals: Vec<f64> = result.rows().iter().map(|r| r.total_volume).collect();
    // Oak Desk x "two" coerces the quantity to 0; Filing Cabinet's CBM "tbd" is 0.
    assert_eq!(totals, vec![1.5, 1.0, 0.0, 8.4, 0.0, 0.0, 0.0]);
    assert!((result.trailer().total_volume - 10.9).abs() < 1e-9);

    let out = render(&source, &result).unwrap();
    assert_eq!(out.headers.len(), 7);
    assert_eq!(out.headers[5], "Volume");
    assert_eq!(out.headers[6], "Total Volume");
    assert_eq!(out.row_count(), source.row_count() + 1);
    assert_eq!(out.cell(3, 5), &Cell::Number(0.84));
    assert_eq!(out.cell(3, 1), &Cell::text("SO-3"));

    let trailer = out.rows.last().unwrap();
    assert!(trailer[..6].iter().all(Cell::is_empty));
    assert_eq!(trailer[6], Cell::Number(result.trailer().total_volume));
}

#[test]
fn summary_counts_every_outcome() {
    let index = CatalogIndex::from_table(&catalog_table()).unwrap();
    let rows = warehouse_rows(&warehouse_table(), &ColumnSelection::default()).unwrap();
    let summary = reconcile(&rows, &index).summary();

    assert_eq!(summary.rows, 7);
    assert_eq!(summary.exact, 3);
    assert_eq!(summary.fuzzy, 2);
    assert_eq!(summary.unresolved, 1);
    assert_eq!(summary.blank, 1);
}

#[test]
fn job_columns_drive_row_extraction() {
    let config = JobConfig::from_toml(
        r#"
name = "custom layout"

[catalog]
source = "catalog.csv"

[warehouse]
name_column = 4
order_column = 2
quantity_column = 5
"#,
    )
    .unwrap();
    let rows = warehouse_rows(&warehouse_table(), &config.warehouse.columns()).unwrap();
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[0].raw_name, "Widget A");
    assert_eq!(rows[0].quantity, 3.0);
}

#[test]
fn out_of_range_quantity_column_is_configuration_error() {
    let columns = ColumnSelection::new(4, 9).with_order_column(2);
    let err = warehouse_rows(&warehouse_table(), &columns).unwrap_err();
    match err {
        VolumeError::Configuration(msg) => {
            assert!(msg.contains("quantity_column 9"), "{msg}");
            assert!(msg.contains("5 column(s)"), "{msg}");
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[test]
fn catalog_without_cbm_is_schema_error() {
    let table = Table::new(
        vec!["Product Name".into(), "Volume".into()],
        vec![vec![Cell::text("Widget A"), Cell::Number(0.5)]],
    );
    let err = CatalogIndex::from_table(&table).unwrap_err();
    assert_eq!(err.to_string(), "catalog schema error: missing field(s) 'CBM'");
}
