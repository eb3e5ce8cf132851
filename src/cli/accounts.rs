use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use puc::exporter::build_filter;
use puc::fmt::{check, money};
use puc::models::{Account, AccountFilter, ExportOptions};
use puc::store::AccountStore;
use puc::tree::{AccountNode, AccountTree};
use puc::{PucError, Result};

use super::open_store;

pub fn list(class: Option<String>, include_inactive: bool) -> Result<()> {
    let (_, store) = open_store()?;
    let filter = build_filter(&ExportOptions {
        class,
        include_inactive,
        ..Default::default()
    })?;
    let accounts = store.list(&filter)?;

    let mut table = Table::new();
    table.set_header(vec!["Código", "Nombre", "Nivel", "Tipo", "Naturaleza", "Estado", "Saldo final"]);
    for acct in &accounts {
        table.add_row(vec![
            Cell::new(&acct.code),
            Cell::new(&acct.name),
            Cell::new(acct.level.label()),
            Cell::new(acct.account_type),
            Cell::new(acct.normal_side),
            Cell::new(acct.status_label()),
            Cell::new(money(acct.balances.closing)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("Cuentas ({})\n{table}", accounts.len());
    Ok(())
}

pub fn tree(root: Option<&str>, depth: Option<usize>) -> Result<()> {
    let (_, store) = open_store()?;
    let tree = AccountTree::build(store.list(&AccountFilter::default())?);

    let nodes = match root {
        Some(code) => vec![tree
            .subtree(code)
            .ok_or_else(|| PucError::UnknownAccount(code.to_string()))?],
        None => tree.forest(),
    };

    if nodes.is_empty() {
        println!("No hay cuentas. Ejecute `puc import ARCHIVO` primero.");
    }
    for node in &nodes {
        print_node(node, 0, depth);
    }
    Ok(())
}

fn print_node(node: &AccountNode, indent: usize, depth: Option<usize>) {
    let acct = &node.account;
    let line = format!("{}{}  {}", "  ".repeat(indent), acct.code, acct.name);
    if acct.active {
        println!("{line}");
    } else {
        println!("{}", line.dimmed());
    }
    if depth.map_or(true, |d| indent + 1 < d) {
        for child in &node.children {
            print_node(child, indent + 1, depth);
        }
    }
}

pub fn show(code: &str) -> Result<()> {
    let (_, store) = open_store()?;
    let acct = store
        .find_by_code(code.trim())?
        .ok_or_else(|| PucError::UnknownAccount(code.to_string()))?;

    print_details(&acct);

    let tree = AccountTree::build(store.list(&AccountFilter::default())?);
    let ancestors = tree.ancestors(&acct.code);
    if ancestors.len() > 1 {
        println!();
        println!("Jerarquía:");
        for (i, a) in ancestors.iter().enumerate() {
            println!("  {}{}  {}", "  ".repeat(i), a.code, a.name);
        }
    }

    let children = tree.children(&acct.code);
    if !children.is_empty() {
        println!();
        println!("Subcuentas ({}):", children.len());
        for child in children {
            println!("  {}  {}", child.code, child.name);
        }
    }
    Ok(())
}

fn print_details(acct: &Account) {
    println!("{}  {}", acct.code.bold(), acct.name.bold());
    println!("Nivel:          {} ({})", acct.level.number(), acct.level.label());
    println!("Padre:          {}", acct.parent_code.as_deref().unwrap_or("(ninguno)"));
    println!("Tipo:           {}", acct.account_type);
    println!("Naturaleza:     {}", acct.normal_side);
    println!("Estado:         {}", acct.status_label());
    println!("Saldo inicial:  {}", money(acct.balances.opening));
    println!("Saldo final:    {}", money(acct.balances.closing));
    println!("Débitos:        {}", money(acct.movements.debit_total));
    println!("Créditos:       {}", money(acct.movements.credit_total));
    if let Some(cc) = &acct.attributes.cost_center {
        println!("Centro costo:   {cc}");
    }

    let flags = acct.fiscal.flags;
    let mut table = Table::new();
    table.set_header(vec!["Renta", "IVA", "ICA", "Retención", "Exógena"]);
    table.add_row(flags.as_array().iter().map(|f| Cell::new(check(*f))).collect::<Vec<_>>());
    println!("{table}");
    if let Some(note) = &acct.fiscal.note {
        println!("Nota fiscal:    {note}");
    }
}
