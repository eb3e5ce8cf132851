use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, instrument, warn};

use crate::error::{PucError, Result};
use crate::hierarchy::ordering_key;
use crate::models::{
    Account, CandidateRecord, ImportOptions, ImportOutcome, ImportSummary, RowIssue,
    ValidationResult,
};
use crate::parser::{parse_rows, read_rows, read_workbook_bytes, RawRow};
use crate::store::AccountStore;
use crate::validator::validate_batch;

/// Serialises imports against the account table within this process.
static IMPORT_LOCK: Mutex<()> = Mutex::new(());

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Shared flag that stops an import after the record in progress.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Inserted,
    Updated,
    Skipped,
}

/// Everything decided while reconciling one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub summary: ImportSummary,
    pub errors: Vec<RowIssue>,
    pub warnings: Vec<String>,
    pub cancelled: bool,
    pub rolled_back: bool,
}

impl Reconciliation {
    fn record(mut self, record: &CandidateRecord, result: Result<Decision>) -> Self {
        self.summary.processed += 1;
        match result {
            Ok(Decision::Inserted) => self.summary.inserted += 1,
            Ok(Decision::Updated) => self.summary.updated += 1,
            Ok(Decision::Skipped) => {
                self.summary.skipped += 1;
                self.warnings.push(format!(
                    "Fila {}: Cuenta {} ya existe, omitida",
                    record.row, record.code
                ));
            }
            Err(e) => {
                warn!(row = record.row, code = %record.code, error = %e, "failed to persist account");
                self.summary.errored += 1;
                self.errors.push(RowIssue::new(
                    record.row,
                    format!("Error al guardar la cuenta {}: {e}", record.code),
                ));
            }
        }
        self
    }
}

/// Sorts by `(level, code)` so parents come before their children.
pub fn order_records(records: &mut [CandidateRecord]) {
    records.sort_by(|a, b| ordering_key(&a.code).cmp(&ordering_key(&b.code)));
}

fn new_account(record: &CandidateRecord, options: &ImportOptions) -> Result<Account> {
    let mut account = Account::from_code(&record.code, &record.name)
        .ok_or_else(|| PucError::Other(format!("Código inválido: {}", record.code)))?;
    account.active = record.active.unwrap_or(true);
    if options.import_balances {
        account.balances = record.balances;
    }
    account.movements = record.movements.clone();
    account.attributes = record.attributes.clone();
    if options.import_fiscal {
        account.fiscal = record.fiscal.clone();
    }
    Ok(account)
}

// Level, parent, type, and nature stay as stored; only attributes move.
fn merge_attributes(existing: &Account, record: &CandidateRecord, options: &ImportOptions) -> Account {
    let mut account = existing.clone();
    account.name = record.name.clone();
    if let Some(active) = record.active {
        account.active = active;
    }
    if options.import_balances {
        account.balances = record.balances;
    }
    account.movements = record.movements.clone();
    account.attributes = record.attributes.clone();
    if options.import_fiscal {
        account.fiscal = record.fiscal.clone();
    }
    account
}

fn reconcile_record<S: AccountStore + ?Sized>(
    store: &mut S,
    record: &CandidateRecord,
    options: &ImportOptions,
) -> Result<Decision> {
    let decision = match store.find_by_code(&record.code)? {
        None => {
            store.create(&new_account(record, options)?)?;
            Decision::Inserted
        }
        Some(existing) if options.overwrite => {
            store.update(&merge_attributes(&existing, record, options))?;
            Decision::Updated
        }
        Some(_) => Decision::Skipped,
    };
    debug!(row = record.row, code = %record.code, ?decision, "reconciled account");
    Ok(decision)
}

/// Applies insert/update/skip decisions for a validated batch.
///
/// Records are processed one at a time in `(level, code)` order. A store
/// failure on one record is kept as a row error and the loop moves on. With
/// `options.atomic` the whole batch shares one transaction that is rolled
/// back on any row error or cancellation.
#[instrument(level = "info", skip_all, fields(records = records.len(), atomic = options.atomic))]
pub fn reconcile<S: AccountStore + ?Sized>(
    store: &mut S,
    mut records: Vec<CandidateRecord>,
    options: &ImportOptions,
    cancel: &CancelFlag,
) -> Reconciliation {
    let _guard = IMPORT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    order_records(&mut records);

    if options.atomic {
        if let Err(e) = store.begin() {
            return Reconciliation {
                errors: vec![RowIssue::new(0, format!("No se pudo iniciar la transacción: {e}"))],
                rolled_back: true,
                ..Default::default()
            };
        }
    }

    let mut result = records
        .iter()
        .take_while(|_| !cancel.is_cancelled())
        .fold(Reconciliation::default(), |acc, record| {
            let outcome = reconcile_record(store, record, options);
            acc.record(record, outcome)
        });
    result.cancelled = result.summary.processed < records.len();

    if options.atomic {
        if result.summary.errored > 0 || result.cancelled {
            rollback(store, &mut result);
        } else if let Err(e) = store.commit() {
            result.errors.push(RowIssue::new(0, format!("No se pudo confirmar la transacción: {e}")));
            rollback(store, &mut result);
        }
    }

    info!(
        processed = result.summary.processed,
        inserted = result.summary.inserted,
        updated = result.summary.updated,
        skipped = result.summary.skipped,
        errored = result.summary.errored,
        cancelled = result.cancelled,
        "reconciliation finished"
    );
    result
}

fn rollback<S: AccountStore + ?Sized>(store: &mut S, result: &mut Reconciliation) {
    if let Err(e) = store.rollback() {
        warn!(error = %e, "rollback failed");
    }
    result.rolled_back = true;
    result.summary.inserted = 0;
    result.summary.updated = 0;
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

fn outcome_message(rec: &Reconciliation, total: usize) -> String {
    let s = &rec.summary;
    if rec.rolled_back {
        format!(
            "Importación revertida: {} errores, ningún cambio fue guardado",
            s.errored.max(rec.errors.len())
        )
    } else if rec.cancelled {
        format!(
            "Importación cancelada tras procesar {} de {total} cuentas",
            s.processed
        )
    } else {
        format!(
            "Importación completada: {} insertadas, {} actualizadas, {} omitidas, {} con error",
            s.inserted, s.updated, s.skipped, s.errored
        )
    }
}

/// Parses and validates rows without touching storage.
pub fn validate_rows(rows: &[RawRow], options: &ImportOptions) -> ValidationResult {
    let (records, skipped) = parse_rows(rows, options.start_row);
    let mut result = validate_batch(&records, options);
    let mut warnings: Vec<String> = skipped.iter().map(ToString::to_string).collect();
    warnings.append(&mut result.warnings);
    result.warnings = warnings;
    result
}

pub fn validate_file(path: &Path, options: &ImportOptions) -> Result<ValidationResult> {
    let rows = read_rows(path, &options.sheet)?;
    Ok(validate_rows(&rows, options))
}

/// Runs parse, validate, and reconcile over rows already read from a sheet.
#[instrument(level = "info", skip_all, fields(rows = rows.len()))]
pub fn import_rows<S: AccountStore + ?Sized>(
    store: &mut S,
    rows: &[RawRow],
    options: &ImportOptions,
    cancel: &CancelFlag,
) -> ImportOutcome {
    let (records, skipped) = parse_rows(rows, options.start_row);
    let mut warnings: Vec<String> = skipped.iter().map(ToString::to_string).collect();
    info!(records = records.len(), skipped = skipped.len(), "parsed sheet rows");

    if records.is_empty() {
        return ImportOutcome {
            warnings,
            ..ImportOutcome::failure("El archivo no contiene cuentas para importar")
        };
    }

    let validation = validate_batch(&records, options);
    warnings.extend(validation.warnings);
    if !validation.valid {
        info!(errors = validation.errors.len(), "batch rejected by validation");
        return ImportOutcome {
            success: false,
            message: format!(
                "Validación fallida: {} errores, no se importó ninguna cuenta",
                validation.errors.len()
            ),
            summary: ImportSummary::default(),
            errors: validation.errors,
            warnings,
        };
    }

    let total = records.len();
    let rec = reconcile(store, records, options, cancel);
    warnings.extend(rec.warnings.iter().cloned());
    ImportOutcome {
        success: rec.summary.errored == 0 && rec.errors.is_empty() && !rec.cancelled,
        message: outcome_message(&rec, total),
        summary: rec.summary,
        errors: rec.errors,
        warnings,
    }
}

/// Imports a workbook or CSV file from disk. Never fails: problems with the
/// file itself come back as an unsuccessful outcome.
#[instrument(level = "info", skip_all, fields(path = %path.display(), sheet = %options.sheet))]
pub fn import_file<S: AccountStore + ?Sized>(
    store: &mut S,
    path: &Path,
    options: &ImportOptions,
    cancel: &CancelFlag,
) -> ImportOutcome {
    match read_rows(path, &options.sheet) {
        Ok(rows) => import_rows(store, &rows, options, cancel),
        Err(e) => {
            warn!(error = %e, "could not read import file");
            ImportOutcome::failure(e.to_string())
        }
    }
}

/// Imports an in-memory xlsx buffer.
pub fn import_bytes<S: AccountStore + ?Sized>(
    store: &mut S,
    bytes: &[u8],
    options: &ImportOptions,
    cancel: &CancelFlag,
) -> ImportOutcome {
    match read_workbook_bytes(bytes, &options.sheet) {
        Ok(rows) => import_rows(store, &rows, options, cancel),
        Err(e) => ImportOutcome::failure(e.to_string()),
    }
}
