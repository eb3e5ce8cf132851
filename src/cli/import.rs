use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};

use puc::importer::{import_file, validate_file, CancelFlag};
use puc::models::{ImportOptions, ImportOutcome, ValidationResult};
use puc::settings::load_settings;
use puc::{PucError, Result};

use super::open_store;

#[derive(Debug, Default)]
pub struct ImportArgs {
    pub sheet: Option<String>,
    pub start_row: Option<usize>,
    pub overwrite: bool,
    pub no_hierarchy: bool,
    pub no_balances: bool,
    pub no_fiscal: bool,
    pub atomic: bool,
    pub json: bool,
}

impl ImportArgs {
    fn options(&self, default_sheet: &str, default_start_row: usize) -> ImportOptions {
        ImportOptions {
            sheet: self.sheet.clone().unwrap_or_else(|| default_sheet.to_string()),
            start_row: self.start_row.unwrap_or(default_start_row),
            overwrite: self.overwrite,
            validate_hierarchy: !self.no_hierarchy,
            import_balances: !self.no_balances,
            import_fiscal: !self.no_fiscal,
            atomic: self.atomic,
        }
    }
}

pub fn run(file: &str, args: ImportArgs) -> Result<()> {
    let file_path = PathBuf::from(file);
    let (settings, mut store) = open_store()?;
    let options = args.options(&settings.default_sheet, settings.start_row);

    let outcome = import_file(&mut store, &file_path, &options, &CancelFlag::new());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    if outcome.success {
        Ok(())
    } else {
        Err(PucError::Other(outcome.message))
    }
}

pub fn validate(file: &str, args: ImportArgs) -> Result<()> {
    let file_path = PathBuf::from(file);
    let settings = load_settings();
    let options = args.options(&settings.default_sheet, settings.start_row);

    let result = validate_file(&file_path, &options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_validation(&result);
    }

    if result.valid {
        Ok(())
    } else {
        Err(PucError::Other(format!("{} errores de validación", result.errors.len())))
    }
}

fn print_outcome(outcome: &ImportOutcome) {
    let s = &outcome.summary;
    let mut table = Table::new();
    table.set_header(vec!["Procesadas", "Insertadas", "Actualizadas", "Omitidas", "Errores"]);
    table.add_row(vec![
        Cell::new(s.processed),
        Cell::new(s.inserted),
        Cell::new(s.updated),
        Cell::new(s.skipped),
        Cell::new(s.errored),
    ]);
    println!("{table}");

    print_issues(&outcome.errors.iter().map(ToString::to_string).collect::<Vec<_>>(), &outcome.warnings);

    if outcome.success {
        println!("{}", outcome.message.green());
    } else {
        println!("{}", outcome.message.red());
    }
}

fn print_validation(result: &ValidationResult) {
    print_issues(&result.error_messages(), &result.warnings);
    if result.valid {
        println!("{}", "Archivo válido".green());
    }
}

fn print_issues(errors: &[String], warnings: &[String]) {
    for error in errors {
        println!("  {} {error}", "error:".red().bold());
    }
    for warning in warnings {
        println!("  {} {warning}", "aviso:".yellow());
    }
}
