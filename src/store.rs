//! Account persistence seen from the engine: look up by code, create,
//! update attribute fields, and list with a filter.

use std::path::Path;

use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::db::{get_connection, init_db};
use crate::error::{PucError, Result};
use crate::hierarchy::{AccountType, Level, NormalSide};
use crate::models::{
    Account, AccountFilter, Attributes, Balances, Fiscal, FiscalFlags, Movements,
};

pub trait AccountStore {
    fn find_by_code(&self, code: &str) -> Result<Option<Account>>;

    fn create(&mut self, account: &Account) -> Result<Account>;

    /// Writes attribute fields only. Code and the fields derived from it are
    /// never changed by an update.
    fn update(&mut self, account: &Account) -> Result<Account>;

    /// Accounts matching `filter`, ascending by code.
    fn list(&self, filter: &AccountFilter) -> Result<Vec<Account>>;

    fn begin(&mut self) -> Result<()> {
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        Ok(())
    }
}

const SELECT_ACCOUNT: &str = "SELECT id, code, name, level, parent_code, account_type, normal_side, \
     is_active, opening_balance, closing_balance, movement_id, debit_total, credit_total, \
     operation_type, cost_center, type_code, aux_code_1, aux_code_2, aux_code_3, aux_code_4, \
     fiscal_renta, fiscal_iva, fiscal_ica, fiscal_retencion, fiscal_exogena, fiscal_note \
     FROM accounts";

fn invalid_column(idx: usize, name: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(idx, name.to_string(), Type::Text)
}

fn row_to_account(row: &Row) -> rusqlite::Result<Account> {
    let level: u8 = row.get(3)?;
    let account_type: String = row.get(5)?;
    let normal_side: String = row.get(6)?;
    Ok(Account {
        id: Some(row.get(0)?),
        code: row.get(1)?,
        name: row.get(2)?,
        level: Level::from_number(level).ok_or_else(|| invalid_column(3, "level"))?,
        parent_code: row.get(4)?,
        account_type: AccountType::parse(&account_type)
            .ok_or_else(|| invalid_column(5, "account_type"))?,
        normal_side: NormalSide::parse(&normal_side)
            .ok_or_else(|| invalid_column(6, "normal_side"))?,
        active: row.get(7)?,
        balances: Balances {
            opening: row.get(8)?,
            closing: row.get(9)?,
        },
        movements: Movements {
            movement_id: row.get(10)?,
            debit_total: row.get(11)?,
            credit_total: row.get(12)?,
        },
        attributes: Attributes {
            operation_type: row.get(13)?,
            cost_center: row.get(14)?,
            type_code: row.get(15)?,
            aux_codes: [row.get(16)?, row.get(17)?, row.get(18)?, row.get(19)?],
        },
        fiscal: Fiscal {
            flags: FiscalFlags {
                renta: row.get(20)?,
                iva: row.get(21)?,
                ica: row.get(22)?,
                retencion: row.get(23)?,
                exogena: row.get(24)?,
            },
            note: row.get(25)?,
        },
    })
}

/// [`AccountStore`] backed by the `accounts` table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (and initialises) the database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        Ok(Self::new(conn))
    }

    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT count(*) FROM accounts", [], |r| r.get(0))?)
    }
}

impl AccountStore for SqliteStore {
    fn find_by_code(&self, code: &str) -> Result<Option<Account>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{SELECT_ACCOUNT} WHERE code = ?1"))?;
        Ok(stmt.query_row([code], row_to_account).optional()?)
    }

    fn create(&mut self, account: &Account) -> Result<Account> {
        let a = account;
        let [aux1, aux2, aux3, aux4] = &a.attributes.aux_codes;
        let f = a.fiscal.flags;
        self.conn.execute(
            "INSERT INTO accounts (code, name, level, parent_code, account_type, normal_side, \
             is_active, opening_balance, closing_balance, movement_id, debit_total, credit_total, \
             operation_type, cost_center, type_code, aux_code_1, aux_code_2, aux_code_3, aux_code_4, \
             fiscal_renta, fiscal_iva, fiscal_ica, fiscal_retencion, fiscal_exogena, fiscal_note) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
             ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)",
            rusqlite::params![
                a.code,
                a.name,
                a.level.number(),
                a.parent_code,
                a.account_type.as_str(),
                a.normal_side.as_str(),
                a.active,
                a.balances.opening,
                a.balances.closing,
                a.movements.movement_id,
                a.movements.debit_total,
                a.movements.credit_total,
                a.attributes.operation_type,
                a.attributes.cost_center,
                a.attributes.type_code,
                aux1,
                aux2,
                aux3,
                aux4,
                f.renta,
                f.iva,
                f.ica,
                f.retencion,
                f.exogena,
                a.fiscal.note,
            ],
        )?;
        let mut created = account.clone();
        created.id = Some(self.conn.last_insert_rowid());
        Ok(created)
    }

    fn update(&mut self, account: &Account) -> Result<Account> {
        let a = account;
        let [aux1, aux2, aux3, aux4] = &a.attributes.aux_codes;
        let f = a.fiscal.flags;
        let changed = self.conn.execute(
            "UPDATE accounts SET name = ?2, is_active = ?3, opening_balance = ?4, \
             closing_balance = ?5, movement_id = ?6, debit_total = ?7, credit_total = ?8, \
             operation_type = ?9, cost_center = ?10, type_code = ?11, aux_code_1 = ?12, \
             aux_code_2 = ?13, aux_code_3 = ?14, aux_code_4 = ?15, fiscal_renta = ?16, \
             fiscal_iva = ?17, fiscal_ica = ?18, fiscal_retencion = ?19, fiscal_exogena = ?20, \
             fiscal_note = ?21, updated_at = datetime('now') WHERE code = ?1",
            rusqlite::params![
                a.code,
                a.name,
                a.active,
                a.balances.opening,
                a.balances.closing,
                a.movements.movement_id,
                a.movements.debit_total,
                a.movements.credit_total,
                a.attributes.operation_type,
                a.attributes.cost_center,
                a.attributes.type_code,
                aux1,
                aux2,
                aux3,
                aux4,
                f.renta,
                f.iva,
                f.ica,
                f.retencion,
                f.exogena,
                a.fiscal.note,
            ],
        )?;
        if changed == 0 {
            return Err(PucError::UnknownAccount(a.code.clone()));
        }
        self.find_by_code(&a.code)?
            .ok_or_else(|| PucError::UnknownAccount(a.code.clone()))
    }

    fn list(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(active) = filter.active {
            conditions.push("is_active = ?");
            values.push(Value::Integer(active as i64));
        }
        if let Some(account_type) = filter.account_type {
            conditions.push("account_type = ?");
            values.push(Value::Text(account_type.as_str().to_string()));
        }
        if let Some(class) = filter.class {
            conditions.push("substr(code, 1, 1) = ?");
            values.push(Value::Text(class.to_string()));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let sql = format!("{SELECT_ACCOUNT}{where_clause} ORDER BY code");
        let mut stmt = self.conn.prepare(&sql)?;
        let accounts = stmt
            .query_map(rusqlite::params_from_iter(values), row_to_account)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    fn begin(&mut self) -> Result<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}
