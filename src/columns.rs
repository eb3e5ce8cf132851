//! The fixed 26-column PUC sheet layout, shared by the parser and the export
//! composer so both sides read and write the same positions.

use crate::hierarchy::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    OpeningBalance,
    ClosingBalance,
    Clase,
    Grupo,
    Cuenta,
    Subcuenta,
    Detalle,
    MovementId,
    Name,
    OperationType,
    CostCenter,
    DebitTotal,
    CreditTotal,
    TypeCode,
    Level,
    Aux1,
    Aux2,
    Aux3,
    Aux4,
    FiscalRenta,
    FiscalIva,
    FiscalIca,
    FiscalRetencion,
    FiscalExogena,
    FiscalNote,
    Status,
}

/// Column groups. Exports may leave out balances, movements, and fiscal data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnGroup {
    Balances,
    Hierarchy,
    Movements,
    Identity,
    Attributes,
    Fiscal,
}

pub const COLUMN_COUNT: usize = 26;

/// Columns in sheet order; a column's position in this table is its index.
pub const COLUMNS: [Column; COLUMN_COUNT] = [
    Column::OpeningBalance,
    Column::ClosingBalance,
    Column::Clase,
    Column::Grupo,
    Column::Cuenta,
    Column::Subcuenta,
    Column::Detalle,
    Column::MovementId,
    Column::Name,
    Column::OperationType,
    Column::CostCenter,
    Column::DebitTotal,
    Column::CreditTotal,
    Column::TypeCode,
    Column::Level,
    Column::Aux1,
    Column::Aux2,
    Column::Aux3,
    Column::Aux4,
    Column::FiscalRenta,
    Column::FiscalIva,
    Column::FiscalIca,
    Column::FiscalRetencion,
    Column::FiscalExogena,
    Column::FiscalNote,
    Column::Status,
];

/// Hierarchy columns from least to most specific.
pub const HIERARCHY_COLUMNS: [Column; 5] = [
    Column::Clase,
    Column::Grupo,
    Column::Cuenta,
    Column::Subcuenta,
    Column::Detalle,
];

pub const FISCAL_FLAG_COLUMNS: [Column; 5] = [
    Column::FiscalRenta,
    Column::FiscalIva,
    Column::FiscalIca,
    Column::FiscalRetencion,
    Column::FiscalExogena,
];

pub const AUX_COLUMNS: [Column; 4] = [Column::Aux1, Column::Aux2, Column::Aux3, Column::Aux4];

/// First header row: group captions over the column headers.
pub const GROUP_HEADER_ROW: [&str; COLUMN_COUNT] = [
    "SALDOS", "", "JERARQUÍA PUC", "", "", "", "", "MOVIMIENTO", "CUENTA", "", "", "MOVIMIENTOS", "",
    "CLASIFICACIÓN", "", "AUXILIARES", "", "", "", "INFORMACIÓN FISCAL", "", "", "", "", "", "ESTADO",
];

pub const NUMBER_OF_HEADER_ROWS: usize = 2;

impl Column {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn header(self) -> &'static str {
        match self {
            Self::OpeningBalance => "Saldo inicial",
            Self::ClosingBalance => "Saldo final",
            Self::Clase => "Clase",
            Self::Grupo => "Grupo",
            Self::Cuenta => "Cuenta",
            Self::Subcuenta => "Subcuenta",
            Self::Detalle => "Detalle",
            Self::MovementId => "ID movimiento",
            Self::Name => "Nombre",
            Self::OperationType => "Tipo operación",
            Self::CostCenter => "Centro de costo",
            Self::DebitTotal => "Débitos",
            Self::CreditTotal => "Créditos",
            Self::TypeCode => "Código tipo",
            Self::Level => "Nivel",
            Self::Aux1 => "Auxiliar 1",
            Self::Aux2 => "Auxiliar 2",
            Self::Aux3 => "Auxiliar 3",
            Self::Aux4 => "Auxiliar 4",
            Self::FiscalRenta => "Renta",
            Self::FiscalIva => "IVA",
            Self::FiscalIca => "ICA",
            Self::FiscalRetencion => "Retención",
            Self::FiscalExogena => "Exógena",
            Self::FiscalNote => "Conciliación fiscal",
            Self::Status => "Estado",
        }
    }

    pub fn group(self) -> ColumnGroup {
        match self {
            Self::OpeningBalance | Self::ClosingBalance => ColumnGroup::Balances,
            Self::Clase | Self::Grupo | Self::Cuenta | Self::Subcuenta | Self::Detalle => {
                ColumnGroup::Hierarchy
            }
            Self::MovementId | Self::DebitTotal | Self::CreditTotal => ColumnGroup::Movements,
            Self::Name | Self::Level | Self::Status => ColumnGroup::Identity,
            Self::OperationType | Self::CostCenter | Self::TypeCode => ColumnGroup::Attributes,
            Self::Aux1 | Self::Aux2 | Self::Aux3 | Self::Aux4 => ColumnGroup::Attributes,
            Self::FiscalRenta
            | Self::FiscalIva
            | Self::FiscalIca
            | Self::FiscalRetencion
            | Self::FiscalExogena
            | Self::FiscalNote => ColumnGroup::Fiscal,
        }
    }

    /// Hierarchy column that holds codes of the given level.
    pub fn for_level(level: Level) -> Column {
        HIERARCHY_COLUMNS[level.number() as usize - 1]
    }
}

/// Second header row: one caption per column.
pub fn column_header_row() -> [&'static str; COLUMN_COUNT] {
    COLUMNS.map(Column::header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_matches_indices() {
        for (i, col) in COLUMNS.iter().enumerate() {
            assert_eq!(col.index(), i, "{col:?}");
        }
    }

    #[test]
    fn test_hierarchy_columns_by_level() {
        assert_eq!(Column::for_level(Level::Clase), Column::Clase);
        assert_eq!(Column::for_level(Level::Cuenta), Column::Cuenta);
        assert_eq!(Column::for_level(Level::Detalle), Column::Detalle);
        assert!(HIERARCHY_COLUMNS.iter().all(|c| c.group() == ColumnGroup::Hierarchy));
    }

    #[test]
    fn test_header_rows_are_full_width() {
        let headers = column_header_row();
        assert_eq!(headers.len(), COLUMN_COUNT);
        assert_eq!(headers[Column::Name.index()], "Nombre");
        assert_eq!(GROUP_HEADER_ROW[Column::Clase.index()], "JERARQUÍA PUC");
        assert!(headers.iter().all(|h| !h.is_empty()));
    }
}
