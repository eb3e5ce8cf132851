use std::borrow::Cow;
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::OnceLock;

use calamine::{Data, Range, Reader, Xlsx};
use regex::Regex;

use crate::columns::{Column, AUX_COLUMNS, FISCAL_FLAG_COLUMNS, HIERARCHY_COLUMNS};
use crate::error::{PucError, Result};
use crate::models::{
    parse_status, Attributes, Balances, CandidateRecord, Fiscal, FiscalFlags, Movements,
};

// ---------------------------------------------------------------------------
// Raw rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl RawCell {
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Empty => Cow::Borrowed(""),
            Self::Text(s) => Cow::Borrowed(s.trim()),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Cow::Owned(format!("{}", *n as i64))
            }
            Self::Number(n) => Cow::Owned(n.to_string()),
            Self::Bool(b) => Cow::Owned(b.to_string()),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text().is_empty()
    }
}

impl From<&Data> for RawCell {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => Self::Empty,
            Data::String(s) => Self::Text(s.clone()),
            Data::Float(f) => Self::Number(*f),
            Data::Int(i) => Self::Number(*i as f64),
            Data::Bool(b) => Self::Bool(*b),
            other => Self::Text(other.to_string()),
        }
    }
}

/// One sheet row with its 1-based sheet row number.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub number: usize,
    pub cells: Vec<RawCell>,
}

impl RawRow {
    pub fn from_strings(number: usize, cells: &[&str]) -> Self {
        Self {
            number,
            cells: cells.iter().map(|c| RawCell::Text((*c).to_string())).collect(),
        }
    }

    pub fn cell(&self, column: Column) -> &RawCell {
        self.cells.get(column.index()).unwrap_or(&RawCell::Empty)
    }

    pub fn text(&self, column: Column) -> Cow<'_, str> {
        self.cell(column).text()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(RawCell::is_blank)
    }
}

/// A row that had content but could not become a candidate record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowParseError {
    pub row: usize,
    pub reason: String,
}

impl fmt::Display for RowParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fila {}: {}, omitida", self.row, self.reason)
    }
}

// ---------------------------------------------------------------------------
// Cell helpers
// ---------------------------------------------------------------------------

fn currency_markers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\$|COP|USD|EUR|\s").expect("static pattern"))
}

pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Most specific non-empty hierarchy cell, scanning detail back to class.
pub fn most_specific_code(cells: &[String; 5]) -> Option<&str> {
    cells.iter().rev().find(|c| !c.is_empty()).map(String::as_str)
}

/// Parses amounts written as `1,234.56`, `1.234,56`, `$ 2.000`, `(500)`,
/// or `1E+05`. Anything unparsable is zero.
pub fn parse_amount(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.contains(|c: char| c.eq_ignore_ascii_case(&'e')) {
        if let Ok(v) = trimmed.parse::<f64>() {
            return if v.is_finite() { v } else { 0.0 };
        }
    }
    let cleaned = currency_markers().replace_all(raw, "");
    if cleaned
        .chars()
        .any(|c| !matches!(c, '0'..='9' | '.' | ',' | '(' | ')' | '-'))
    {
        return 0.0;
    }
    let mut s: &str = &cleaned;
    let mut negative = false;
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        negative = true;
        s = inner;
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest;
    }
    match normalize_separators(s).parse::<f64>() {
        Ok(v) if negative => -v,
        Ok(v) => v,
        Err(_) => 0.0,
    }
}

fn normalize_separators(s: &str) -> String {
    match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) => {
            let (thousands, decimal) = if dot > comma { (',', '.') } else { ('.', ',') };
            s.replace(thousands, "").replace(decimal, ".")
        }
        (None, Some(_)) => single_separator(s, ','),
        (Some(_), None) => single_separator(s, '.'),
        (None, None) => s.to_string(),
    }
}

// A lone separator followed by exactly three digits is a thousands mark
// unless the integer part is zero.
fn single_separator(s: &str, sep: char) -> String {
    let count = s.matches(sep).count();
    let (before, after) = s.split_once(sep).unwrap_or((s, ""));
    let grouped = count > 1 || (after.len() == 3 && !before.is_empty() && before != "0");
    if grouped {
        s.replace(sep, "")
    } else {
        s.replace(sep, ".")
    }
}

fn cell_amount(cell: &RawCell) -> f64 {
    match cell {
        RawCell::Number(n) => *n,
        RawCell::Text(s) => parse_amount(s),
        _ => 0.0,
    }
}

pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "1" | "si" | "sí" | "yes" | "x"
    )
}

fn cell_flag(cell: &RawCell) -> bool {
    match cell {
        RawCell::Bool(b) => *b,
        other => parse_flag(&other.text()),
    }
}

pub fn optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

/// Turns one raw row into a candidate record.
///
/// Blank rows yield `Ok(None)`. Rows with content but no code or no name are
/// returned as a [`RowParseError`] so the caller can skip and report them.
/// The `Nivel` column is informational; the level always comes from the code.
pub fn parse_row(raw: &RawRow) -> std::result::Result<Option<CandidateRecord>, RowParseError> {
    if raw.is_blank() {
        return Ok(None);
    }
    let hierarchy = HIERARCHY_COLUMNS.map(|c| digits_only(&raw.text(c)));
    let name = raw.text(Column::Name).trim().to_string();

    let Some(code) = most_specific_code(&hierarchy) else {
        return Err(RowParseError {
            row: raw.number,
            reason: "sin código de cuenta".to_string(),
        });
    };
    if name.is_empty() {
        return Err(RowParseError {
            row: raw.number,
            reason: format!("cuenta {code} sin nombre"),
        });
    }

    let opt = |c: Column| optional_text(&raw.text(c));
    Ok(Some(CandidateRecord {
        row: raw.number,
        code: code.to_string(),
        name,
        active: parse_status(&raw.text(Column::Status)),
        balances: Balances {
            opening: cell_amount(raw.cell(Column::OpeningBalance)),
            closing: cell_amount(raw.cell(Column::ClosingBalance)),
        },
        movements: Movements {
            movement_id: opt(Column::MovementId),
            debit_total: cell_amount(raw.cell(Column::DebitTotal)),
            credit_total: cell_amount(raw.cell(Column::CreditTotal)),
        },
        attributes: Attributes {
            operation_type: opt(Column::OperationType),
            cost_center: opt(Column::CostCenter),
            type_code: opt(Column::TypeCode),
            aux_codes: AUX_COLUMNS.map(opt),
        },
        fiscal: Fiscal {
            flags: FiscalFlags::from_array(FISCAL_FLAG_COLUMNS.map(|c| cell_flag(raw.cell(c)))),
            note: opt(Column::FiscalNote),
        },
    }))
}

/// Parses every row at or after `start_row`, splitting records from skipped rows.
pub fn parse_rows(rows: &[RawRow], start_row: usize) -> (Vec<CandidateRecord>, Vec<RowParseError>) {
    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for raw in rows.iter().filter(|r| r.number >= start_row) {
        match parse_row(raw) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => skipped.push(e),
        }
    }
    (records, skipped)
}

// ---------------------------------------------------------------------------
// Sheet readers
// ---------------------------------------------------------------------------

fn range_to_rows(range: &Range<Data>) -> Vec<RawRow> {
    let Some((first_row, first_col)) = range.start() else {
        return Vec::new();
    };
    range
        .rows()
        .enumerate()
        .map(|(i, row)| {
            let mut cells = vec![RawCell::Empty; first_col as usize];
            cells.extend(row.iter().map(RawCell::from));
            RawRow {
                number: first_row as usize + i + 1,
                cells,
            }
        })
        .collect()
}

fn missing_sheet(sheet: &str, available: &[String]) -> PucError {
    PucError::FileFormat(format!(
        "no existe la hoja '{sheet}' (hojas disponibles: {})",
        available.join(", ")
    ))
}

/// Reads a sheet from an xlsx/xls/ods workbook on disk.
pub fn read_workbook(path: &Path, sheet: &str) -> Result<Vec<RawRow>> {
    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| PucError::FileFormat(format!("no se pudo abrir el archivo: {e}")))?;
    let names = workbook.sheet_names();
    if !names.iter().any(|n| n == sheet) {
        return Err(missing_sheet(sheet, &names));
    }
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| PucError::FileFormat(format!("no se pudo leer la hoja '{sheet}': {e}")))?;
    Ok(range_to_rows(&range))
}

/// Reads a sheet from an in-memory xlsx buffer.
pub fn read_workbook_bytes(bytes: &[u8], sheet: &str) -> Result<Vec<RawRow>> {
    let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e: calamine::XlsxError| {
            PucError::FileFormat(format!("no se pudo abrir el archivo: {e}"))
        })?;
    let names = workbook.sheet_names();
    if !names.iter().any(|n| n == sheet) {
        return Err(missing_sheet(sheet, &names));
    }
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| PucError::FileFormat(format!("no se pudo leer la hoja '{sheet}': {e}")))?;
    Ok(range_to_rows(&range))
}

/// Reads a CSV file laid out like the PUC sheet, header rows included.
pub fn read_csv(path: &Path) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut rows = Vec::new();
    // Empty lines are dropped by the reader; the record position keeps the
    // physical line so row numbers match the file.
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let number = record.position().map_or(i + 1, |p| p.line() as usize);
        rows.push(RawRow {
            number,
            cells: record.iter().map(|f| RawCell::Text(f.to_string())).collect(),
        });
    }
    Ok(rows)
}

/// Picks the reader by file extension.
pub fn read_rows(path: &Path, sheet: &str) -> Result<Vec<RawRow>> {
    let is_csv = path
        .extension()
        .map_or(false, |e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        read_csv(path)
    } else {
        read_workbook(path, sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::COLUMN_COUNT;

    fn row_with(number: usize, cells: &[(Column, &str)]) -> RawRow {
        let mut values = vec![""; COLUMN_COUNT];
        for (col, value) in cells {
            values[col.index()] = value;
        }
        RawRow::from_strings(number, &values)
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), 1234.56);
        assert_eq!(parse_amount("1.234,56"), 1234.56);
        assert_eq!(parse_amount("$ 1.500.000"), 1500000.0);
        assert_eq!(parse_amount("2.000"), 2000.0);
        assert_eq!(parse_amount("0.125"), 0.125);
        assert_eq!(parse_amount("12,5"), 12.5);
        assert_eq!(parse_amount("  -42.50  "), -42.5);
        assert_eq!(parse_amount("not_a_number"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
    }

    #[test]
    fn test_parse_amount_scientific_notation() {
        assert_eq!(parse_amount("1E+05"), 100000.0);
        assert_eq!(parse_amount("1.5E+3"), 1500.0);
        assert_eq!(parse_amount(" 2.5e-1 "), 0.25);
        assert_eq!(parse_amount("12abc"), 0.0);
        assert_eq!(parse_amount("1,5E+3"), 0.0);
        assert_eq!(parse_amount("NaN"), 0.0);
        assert_eq!(parse_amount("inf"), 0.0);
    }

    #[test]
    fn test_parse_amount_negatives() {
        assert_eq!(parse_amount("(500.00)"), -500.0);
        assert_eq!(parse_amount("-$50.00"), -50.0);
        assert_eq!(parse_amount("COP -1.000"), -1000.0);
    }

    #[test]
    fn test_parse_flag() {
        for yes in ["true", "1", "SI", "sí", "Yes", "x", " X "] {
            assert!(parse_flag(yes), "{yes}");
        }
        for no in ["", "no", "0", "false", "n"] {
            assert!(!parse_flag(no), "{no}");
        }
    }

    #[test]
    fn test_most_specific_code_wins() {
        let cells = ["1".to_string(), "11".into(), "1105".into(), String::new(), String::new()];
        assert_eq!(most_specific_code(&cells), Some("1105"));
        let all_empty: [String; 5] = Default::default();
        assert_eq!(most_specific_code(&all_empty), None);
    }

    #[test]
    fn test_parse_row_strips_non_digits() {
        let raw = row_with(3, &[(Column::Subcuenta, "1105-05"), (Column::Name, "Caja general")]);
        let record = parse_row(&raw).unwrap().unwrap();
        assert_eq!(record.code, "110505");
        assert_eq!(record.row, 3);
        assert_eq!(record.name, "Caja general");
        assert_eq!(record.active, None);
        assert_eq!(record.attributes.cost_center, None);
    }

    #[test]
    fn test_parse_row_reads_groups() {
        let raw = row_with(
            7,
            &[
                (Column::OpeningBalance, "1.000.000"),
                (Column::ClosingBalance, "-250,50"),
                (Column::Detalle, "11050501"),
                (Column::Name, "Caja menor"),
                (Column::CostCenter, "CC-01"),
                (Column::DebitTotal, "$300"),
                (Column::Aux2, "A2"),
                (Column::FiscalIva, "si"),
                (Column::FiscalExogena, "X"),
                (Column::FiscalNote, "  revisar  "),
                (Column::Status, "inactiva"),
            ],
        );
        let record = parse_row(&raw).unwrap().unwrap();
        assert_eq!(record.balances.opening, 1_000_000.0);
        assert_eq!(record.balances.closing, -250.5);
        assert_eq!(record.movements.debit_total, 300.0);
        assert_eq!(record.attributes.cost_center.as_deref(), Some("CC-01"));
        assert_eq!(record.attributes.aux_codes[1].as_deref(), Some("A2"));
        assert!(record.fiscal.flags.iva && record.fiscal.flags.exogena);
        assert!(!record.fiscal.flags.renta);
        assert_eq!(record.fiscal.note.as_deref(), Some("revisar"));
        assert_eq!(record.active, Some(false));
    }

    #[test]
    fn test_blank_row_is_ignored() {
        let raw = row_with(4, &[]);
        assert_eq!(parse_row(&raw), Ok(None));
    }

    #[test]
    fn test_row_without_code_or_name_is_skipped() {
        let no_code = row_with(5, &[(Column::Name, "ACTIVOS")]);
        let err = parse_row(&no_code).unwrap_err();
        assert_eq!(err.row, 5);

        let no_name = row_with(6, &[(Column::Grupo, "11")]);
        let err = parse_row(&no_name).unwrap_err();
        assert!(err.to_string().starts_with("Fila 6:"));
    }

    #[test]
    fn test_parse_rows_honours_start_row() {
        let rows = vec![
            row_with(1, &[(Column::Clase, "Clase"), (Column::Name, "Nombre")]),
            row_with(2, &[(Column::Clase, "1"), (Column::Name, "header junk")]),
            row_with(3, &[(Column::Clase, "1"), (Column::Name, "Activo")]),
            row_with(4, &[]),
            row_with(5, &[(Column::Grupo, "11"), (Column::Name, "Disponible")]),
        ];
        let (records, skipped) = parse_rows(&rows, 3);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].code, "11");
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_numeric_cells_keep_precision() {
        let mut raw = row_with(3, &[(Column::Clase, "1"), (Column::Name, "Activo")]);
        raw.cells[Column::OpeningBalance.index()] = RawCell::Number(12.345);
        raw.cells[Column::Clase.index()] = RawCell::Number(1.0);
        let record = parse_row(&raw).unwrap().unwrap();
        assert_eq!(record.balances.opening, 12.345);
        assert_eq!(record.code, "1");
    }

    #[test]
    fn test_read_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("puc.csv");
        let mut content = String::from("SALDOS\nSaldo inicial\n");
        content.push_str(",,1,,,,,,Activo\n");
        content.push_str(",,,11,,,,,Disponible\n");
        std::fs::write(&path, content).unwrap();
        let rows = read_rows(&path, "PUC").unwrap();
        assert_eq!(rows.len(), 4);
        let (records, _) = parse_rows(&rows, 3);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].row, 3);
        assert_eq!(records[1].code, "11");
    }

    #[test]
    fn test_read_csv_keeps_line_numbers_after_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("puc.csv");
        std::fs::write(&path, "H1\nH2\n,,1,,,,,,Activo\n\n,,,,9905,,,,Huerfana\n").unwrap();
        let rows = read_rows(&path, "PUC").unwrap();
        let (records, _) = parse_rows(&rows, 3);
        let rows: Vec<(usize, &str)> = records.iter().map(|r| (r.row, r.code.as_str())).collect();
        assert_eq!(rows, vec![(3, "1"), (5, "9905")]);
    }

    #[test]
    fn test_missing_file_is_file_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_workbook(&dir.path().join("nope.xlsx"), "PUC").unwrap_err();
        assert!(matches!(err, PucError::FileFormat(_)));
    }
}
