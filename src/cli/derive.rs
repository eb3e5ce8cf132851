use puc::hierarchy::{self, Level};
use puc::{PucError, Result};

pub fn run(code: &str) -> Result<()> {
    let code = code.trim();
    let level = hierarchy::level(code)
        .ok_or_else(|| PucError::Other(format!("Código inválido: {code}")))?;
    let side = hierarchy::normal_side(code)
        .ok_or_else(|| PucError::Other(format!("Código inválido: {code}")))?;

    println!("Código:     {code}");
    println!("Nivel:      {} ({})", level.number(), level.label());
    println!(
        "Padre:      {}",
        hierarchy::parent_code(code).as_deref().unwrap_or("(ninguno)")
    );
    println!("Naturaleza: {side}");
    println!("Tipo:       {}", hierarchy::account_type(level));
    println!(
        "Movimiento: {}",
        if level == Level::Detalle { "SI" } else { "NO" }
    );

    println!();
    for target in Level::ALL.into_iter().filter(|l| *l <= level) {
        if let Some(seg) = hierarchy::segment(code, target) {
            println!("  {:<10} {seg}", target.label());
        }
    }
    Ok(())
}
