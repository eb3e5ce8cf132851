//! End-to-end import and export against a real SQLite store.

use std::path::Path;

use puc::columns::{Column, COLUMN_COUNT};
use puc::exporter::export_accounts;
use puc::importer::{import_bytes, import_file, CancelFlag};
use puc::models::{AccountFilter, ExportOptions, ImportOptions};
use puc::store::{AccountStore, SqliteStore};
use tempfile::TempDir;

fn csv_row(cells: &[(Column, &str)]) -> String {
    let mut values = vec![String::new(); COLUMN_COUNT];
    for (col, value) in cells {
        values[col.index()] = value.to_string();
    }
    values.join(",")
}

fn write_plan(path: &Path) {
    let lines = [
        "grupo,,,,,,,,,".to_string(),
        "encabezados".to_string(),
        csv_row(&[(Column::Clase, "1"), (Column::Name, "ACTIVO")]),
        csv_row(&[(Column::Grupo, "11"), (Column::Name, "DISPONIBLE")]),
        csv_row(&[(Column::Cuenta, "1105"), (Column::Name, "CAJA")]),
        csv_row(&[
            (Column::Subcuenta, "110505"),
            (Column::Name, "Caja general"),
            (Column::OpeningBalance, "1500.50"),
            (Column::ClosingBalance, "2000"),
            (Column::FiscalRenta, "SI"),
        ]),
        csv_row(&[
            (Column::Detalle, "11050501"),
            (Column::Name, "Caja menor oficina"),
            (Column::ClosingBalance, "250"),
            (Column::CostCenter, "ADM"),
        ]),
        csv_row(&[(Column::Clase, "2"), (Column::Name, "PASIVO")]),
        csv_row(&[(Column::Grupo, "21"), (Column::Name, "OBLIGACIONES FINANCIERAS")]),
        csv_row(&[
            (Column::Cuenta, "2105"),
            (Column::Name, "Bancos nacionales"),
            (Column::Status, "INACTIVA"),
        ]),
    ];
    std::fs::write(path, lines.join("\n")).unwrap();
}

fn setup() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(&dir.path().join("puc.db")).unwrap();
    write_plan(&dir.path().join("plan.csv"));
    (dir, store)
}

#[test]
fn test_import_csv_derives_hierarchy() {
    let (dir, mut store) = setup();
    let outcome = import_file(
        &mut store,
        &dir.path().join("plan.csv"),
        &ImportOptions::default(),
        &CancelFlag::new(),
    );
    assert!(outcome.success, "{outcome:?}");
    assert_eq!(outcome.summary.inserted, 8);
    assert_eq!(store.count().unwrap(), 8);

    let caja = store.find_by_code("110505").unwrap().unwrap();
    assert_eq!(caja.parent_code.as_deref(), Some("1105"));
    assert_eq!(caja.balances.opening, 1500.50);
    assert!(caja.fiscal.flags.renta);

    let bancos = store.find_by_code("2105").unwrap().unwrap();
    assert!(!bancos.active);
}

#[test]
fn test_second_import_skips_everything() {
    let (dir, mut store) = setup();
    let path = dir.path().join("plan.csv");
    let options = ImportOptions::default();
    import_file(&mut store, &path, &options, &CancelFlag::new());

    let again = import_file(&mut store, &path, &options, &CancelFlag::new());
    assert!(again.success);
    assert_eq!(again.summary.inserted, 0);
    assert_eq!(again.summary.skipped, 8);
    assert_eq!(again.warnings.len(), 8);
    assert_eq!(store.count().unwrap(), 8);
}

#[test]
fn test_export_then_import_preserves_accounts() {
    let (dir, mut store) = setup();
    import_file(
        &mut store,
        &dir.path().join("plan.csv"),
        &ImportOptions::default(),
        &CancelFlag::new(),
    );

    let options = ExportOptions {
        include_inactive: true,
        ..Default::default()
    };
    let buffer = export_accounts(&store, &options).unwrap();

    let other_dir = TempDir::new().unwrap();
    let mut copy = SqliteStore::open(&other_dir.path().join("puc.db")).unwrap();
    let outcome = import_bytes(&mut copy, &buffer, &ImportOptions::default(), &CancelFlag::new());
    assert!(outcome.success, "{outcome:?}");

    let original = store.list(&AccountFilter::default()).unwrap();
    let restored = copy.list(&AccountFilter::default()).unwrap();
    assert_eq!(original.len(), restored.len());
    for (a, b) in original.iter().zip(&restored) {
        assert_eq!(a.code, b.code);
        assert_eq!(a.name, b.name);
        assert_eq!(a.level, b.level);
        assert_eq!(a.active, b.active);
        assert_eq!(a.balances, b.balances);
        assert_eq!(a.fiscal.flags, b.fiscal.flags);
        assert_eq!(a.attributes.cost_center, b.attributes.cost_center);
    }
}

#[test]
fn test_export_active_only_drops_inactive_accounts() {
    let (dir, mut store) = setup();
    import_file(
        &mut store,
        &dir.path().join("plan.csv"),
        &ImportOptions::default(),
        &CancelFlag::new(),
    );

    let buffer = export_accounts(&store, &ExportOptions::default()).unwrap();
    let other_dir = TempDir::new().unwrap();
    let mut copy = SqliteStore::open(&other_dir.path().join("puc.db")).unwrap();
    let outcome = import_bytes(&mut copy, &buffer, &ImportOptions::default(), &CancelFlag::new());

    assert!(outcome.success, "{outcome:?}");
    assert_eq!(outcome.summary.inserted, 7);
    assert!(copy.find_by_code("2105").unwrap().is_none());
}
