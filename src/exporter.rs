use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::{info, instrument};

use crate::columns::{
    column_header_row, Column, ColumnGroup, AUX_COLUMNS, COLUMNS, COLUMN_COUNT,
    FISCAL_FLAG_COLUMNS, GROUP_HEADER_ROW, NUMBER_OF_HEADER_ROWS,
};
use crate::error::{PucError, Result};
use crate::hierarchy::{segment, AccountType};
use crate::models::{parse_status, Account, AccountFilter, ExportOptions};
use crate::store::AccountStore;

pub const INSTRUCTIONS_SHEET: &str = "Instrucciones";

const INSTRUCTIONS: &[&str] = &[
    "PLAN ÚNICO DE CUENTAS - INSTRUCCIONES DE CARGUE",
    "",
    "1. Las dos primeras filas son encabezados; los datos comienzan en la fila 3.",
    "2. Escriba el código de cada cuenta solo en la columna de su nivel:",
    "   Clase (1 dígito), Grupo (2), Cuenta (4), Subcuenta (6), Detalle (8 o más, longitud par).",
    "3. Si una fila tiene varias columnas de jerarquía, se usa la más específica.",
    "4. El nombre es obligatorio y admite hasta 500 caracteres.",
    "5. Nivel, naturaleza, tipo y cuenta padre se calculan a partir del código.",
    "6. Naturaleza débito: clases 1, 5, 6, 7 y 8. Las demás clases son crédito.",
    "7. Solo las cuentas de nivel Detalle reciben movimientos.",
    "8. Banderas fiscales: escriba SI, X o 1 para marcarlas; vacío significa no.",
    "9. Estado: ACTIVA o INACTIVA. Vacío se importa como ACTIVA.",
    "10. Cada cuenta padre debe estar en el mismo archivo cuando se valida la jerarquía.",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ExportCell {
    Blank,
    Text(String),
    Number(f64),
}

pub type ExportRow = [ExportCell; COLUMN_COUNT];

/// Which optional column groups carry data; excluded groups are still
/// emitted, blank or zero, so every row stays 26 columns wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSelection {
    pub balances: bool,
    pub movements: bool,
    pub fiscal: bool,
}

impl Default for ColumnSelection {
    fn default() -> Self {
        Self {
            balances: true,
            movements: true,
            fiscal: true,
        }
    }
}

impl ColumnSelection {
    /// Whether cells of `group` carry account data.
    pub fn includes(&self, group: ColumnGroup) -> bool {
        match group {
            ColumnGroup::Balances => self.balances,
            ColumnGroup::Movements => self.movements,
            ColumnGroup::Fiscal => self.fiscal,
            _ => true,
        }
    }
}

impl From<&ExportOptions> for ColumnSelection {
    fn from(options: &ExportOptions) -> Self {
        Self {
            balances: options.include_balances,
            movements: options.include_movements,
            fiscal: options.include_fiscal,
        }
    }
}

fn check_sheet_name(sheet: &str) -> Result<()> {
    if sheet.trim().eq_ignore_ascii_case(INSTRUCTIONS_SHEET) {
        return Err(PucError::ExportQuery(format!(
            "la hoja de datos no puede llamarse '{INSTRUCTIONS_SHEET}'"
        )));
    }
    Ok(())
}

/// Checks export options and turns them into a store filter.
pub fn build_filter(options: &ExportOptions) -> Result<AccountFilter> {
    check_sheet_name(&options.sheet)?;
    let active = match options.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(parse_status(raw).ok_or_else(|| {
            PucError::ExportQuery(format!("filtro_estado desconocido: {raw}"))
        })?),
        None if options.include_inactive => None,
        None => Some(true),
    };

    let mut account_type = match options.account_type.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(AccountType::parse(raw).ok_or_else(|| {
            PucError::ExportQuery(format!("filtro_tipo desconocido: {raw}"))
        })?),
        None => None,
    };
    if options.postable_only {
        if account_type == Some(AccountType::Madre) {
            return Err(PucError::ExportQuery(
                "solo_movimientos no es compatible con filtro_tipo MADRE".to_string(),
            ));
        }
        account_type = Some(AccountType::Detalle);
    }

    let class = match options.class.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c @ '1'..='9'), None) => Some(c),
                _ => {
                    return Err(PucError::ExportQuery(format!(
                        "filtro_clase debe ser un dígito de 1 a 9: {raw}"
                    )))
                }
            }
        }
        None => None,
    };

    Ok(AccountFilter {
        active,
        account_type,
        class,
    })
}

fn text(value: &Option<String>) -> ExportCell {
    value.clone().map_or(ExportCell::Blank, ExportCell::Text)
}

fn flag(value: bool) -> ExportCell {
    if value {
        ExportCell::Text("SI".to_string())
    } else {
        ExportCell::Blank
    }
}

/// One sheet row for an account. Only the hierarchy column of the account's
/// own level holds its code.
pub fn compose_row(account: &Account, selection: ColumnSelection) -> ExportRow {
    let mut row: ExportRow = std::array::from_fn(|_| ExportCell::Blank);
    let mut set = |column: Column, cell: ExportCell| row[column.index()] = cell;

    if let Some(code) = segment(&account.code, account.level) {
        set(Column::for_level(account.level), ExportCell::Text(code.to_string()));
    }
    set(Column::Name, ExportCell::Text(account.name.clone()));
    set(Column::Level, ExportCell::Number(f64::from(account.level.number())));
    set(Column::Status, ExportCell::Text(account.status_label().to_string()));

    set(Column::OpeningBalance, ExportCell::Number(account.balances.opening));
    set(Column::ClosingBalance, ExportCell::Number(account.balances.closing));
    set(Column::MovementId, text(&account.movements.movement_id));
    set(Column::DebitTotal, ExportCell::Number(account.movements.debit_total));
    set(Column::CreditTotal, ExportCell::Number(account.movements.credit_total));

    set(Column::OperationType, text(&account.attributes.operation_type));
    set(Column::CostCenter, text(&account.attributes.cost_center));
    set(Column::TypeCode, text(&account.attributes.type_code));
    for (column, value) in AUX_COLUMNS.iter().zip(&account.attributes.aux_codes) {
        set(*column, text(value));
    }

    for (column, value) in FISCAL_FLAG_COLUMNS.iter().zip(account.fiscal.flags.as_array()) {
        set(*column, flag(value));
    }
    set(Column::FiscalNote, text(&account.fiscal.note));

    // Excluded groups keep their cells: amounts become zero, text goes blank.
    for column in COLUMNS {
        if !selection.includes(column.group()) {
            let cell = &mut row[column.index()];
            *cell = if matches!(cell, ExportCell::Number(_)) {
                ExportCell::Number(0.0)
            } else {
                ExportCell::Blank
            };
        }
    }

    row
}

/// Rows for `accounts` in ascending code order.
pub fn compose_rows(accounts: &[Account], selection: ColumnSelection) -> Vec<ExportRow> {
    let mut sorted: Vec<&Account> = accounts.iter().collect();
    sorted.sort_by(|a, b| a.code.cmp(&b.code));
    sorted
        .into_iter()
        .map(|account| compose_row(account, selection))
        .collect()
}

fn write_data_sheet(worksheet: &mut Worksheet, sheet: &str, rows: &[ExportRow]) -> Result<()> {
    worksheet.set_name(sheet)?;
    let bold = Format::new().set_bold();

    for (col, caption) in GROUP_HEADER_ROW.iter().enumerate() {
        if !caption.is_empty() {
            worksheet.write_string_with_format(0, col as u16, *caption, &bold)?;
        }
    }
    for (col, header) in column_header_row().iter().enumerate() {
        worksheet.write_string_with_format(1, col as u16, *header, &bold)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + NUMBER_OF_HEADER_ROWS) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                ExportCell::Blank => {}
                ExportCell::Text(s) => {
                    worksheet.write_string(r, col as u16, s)?;
                }
                ExportCell::Number(n) => {
                    worksheet.write_number(r, col as u16, *n)?;
                }
            }
        }
    }

    worksheet.set_column_width(Column::Name.index() as u16, 45)?;
    worksheet.set_column_width(Column::FiscalNote.index() as u16, 30)?;
    worksheet.set_freeze_panes(NUMBER_OF_HEADER_ROWS as u32, 0)?;
    Ok(())
}

fn write_instructions(worksheet: &mut Worksheet) -> Result<()> {
    worksheet.set_name(INSTRUCTIONS_SHEET)?;
    worksheet.set_column_width(0, 100)?;
    let bold = Format::new().set_bold();
    for (i, line) in INSTRUCTIONS.iter().enumerate() {
        if i == 0 {
            worksheet.write_string_with_format(0, 0, *line, &bold)?;
        } else {
            worksheet.write_string(i as u32, 0, *line)?;
        }
    }
    Ok(())
}

/// Builds the xlsx buffer: the data sheet followed by the instructions sheet.
pub fn write_workbook(rows: &[ExportRow], sheet: &str) -> Result<Vec<u8>> {
    check_sheet_name(sheet)?;
    let mut workbook = Workbook::new();
    write_data_sheet(workbook.add_worksheet(), sheet, rows)?;
    write_instructions(workbook.add_worksheet())?;
    Ok(workbook.save_to_buffer()?)
}

/// Lists, filters, and writes accounts. Options are checked before any
/// account is read or any row is written.
#[instrument(level = "info", skip_all)]
pub fn export_accounts<S: AccountStore + ?Sized>(store: &S, options: &ExportOptions) -> Result<Vec<u8>> {
    let filter = build_filter(options)?;
    let accounts = store.list(&filter)?;
    let rows = compose_rows(&accounts, ColumnSelection::from(options));
    info!(accounts = rows.len(), ?filter, "exporting accounts");
    write_workbook(&rows, &options.sheet)
}

/// Empty layout with both header rows, for filling in by hand.
pub fn export_template(sheet: &str) -> Result<Vec<u8>> {
    write_workbook(&[], sheet)
}
