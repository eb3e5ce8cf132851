use std::collections::HashMap;

use crate::hierarchy::{self, Level};
use crate::models::{CandidateRecord, ImportOptions, RowIssue, ValidationResult, MAX_NAME_LEN};

/// Checks a whole batch before anything is persisted.
///
/// Every record goes through every check; errors accumulate across the batch.
/// The batch is valid only when no error was found.
pub fn validate_batch(records: &[CandidateRecord], options: &ImportOptions) -> ValidationResult {
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *occurrences.entry(record.code.as_str()).or_default() += 1;
    }

    // Levels of the batch's own well-formed codes, for the parent check.
    let batch_levels: HashMap<&str, Level> = records
        .iter()
        .filter_map(|r| Some((r.code.as_str(), hierarchy::level(&r.code)?)))
        .collect();

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for record in records {
        let code = record.code.as_str();
        let level = hierarchy::level(code);

        if level.is_none() {
            errors.push(RowIssue::new(record.row, format!("Código inválido: {code}")));
        }
        if occurrences.get(code).copied().unwrap_or(0) > 1 {
            errors.push(RowIssue::new(record.row, format!("Código duplicado: {code}")));
        }
        if record.name.trim().is_empty() {
            errors.push(RowIssue::new(record.row, format!("Nombre requerido para la cuenta {code}")));
        } else if record.name.chars().count() > MAX_NAME_LEN {
            errors.push(RowIssue::new(
                record.row,
                format!("Nombre excede {MAX_NAME_LEN} caracteres en la cuenta {code}"),
            ));
        }

        if options.validate_hierarchy {
            if let (Some(level), Some(parent)) = (level, hierarchy::parent_code(code)) {
                match batch_levels.get(parent.as_str()) {
                    None => errors.push(RowIssue::new(
                        record.row,
                        format!("Cuenta padre {parent} no encontrada"),
                    )),
                    Some(parent_level) if parent_level.number() + 1 != level.number() => {
                        errors.push(RowIssue::new(
                            record.row,
                            format!(
                                "Nivel incorrecto: {code} es nivel {} y su padre {parent} es nivel {}",
                                level.number(),
                                parent_level.number()
                            ),
                        ))
                    }
                    Some(_) => {}
                }
            }
        }

        if options.import_balances {
            if record.balances.opening < 0.0 {
                warnings.push(format!("Fila {}: Saldo inicial negativo en la cuenta {code}", record.row));
            }
            if record.balances.closing < 0.0 {
                warnings.push(format!("Fila {}: Saldo final negativo en la cuenta {code}", record.row));
            }
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}
