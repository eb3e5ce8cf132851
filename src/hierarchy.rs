//! Hierarchy derivation from a PUC account code.
//!
//! Every piece of hierarchy metadata (level, parent, normal side, account
//! type) is a pure function of the code's digits and length. No other module
//! re-implements these mappings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The five PUC levels, keyed by code width 1/2/4/6/8+.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    Clase,
    Grupo,
    Cuenta,
    Subcuenta,
    Detalle,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Clase,
        Level::Grupo,
        Level::Cuenta,
        Level::Subcuenta,
        Level::Detalle,
    ];

    pub fn number(self) -> u8 {
        match self {
            Self::Clase => 1,
            Self::Grupo => 2,
            Self::Cuenta => 3,
            Self::Subcuenta => 4,
            Self::Detalle => 5,
        }
    }

    pub fn from_number(n: u8) -> Option<Level> {
        Self::ALL.into_iter().find(|l| l.number() == n)
    }

    /// Digit width of a code at this level. Detail codes are at least this wide.
    pub fn width(self) -> usize {
        match self {
            Self::Clase => 1,
            Self::Grupo => 2,
            Self::Cuenta => 4,
            Self::Subcuenta => 6,
            Self::Detalle => 8,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Clase => "Clase",
            Self::Grupo => "Grupo",
            Self::Cuenta => "Cuenta",
            Self::Subcuenta => "Subcuenta",
            Self::Detalle => "Detalle",
        }
    }

    pub fn parent(self) -> Option<Level> {
        Self::from_number(self.number().checked_sub(1)?)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Side on which an account normally carries its balance (naturaleza).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NormalSide {
    Debito,
    Credito,
}

impl NormalSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debito => "DEBITO",
            Self::Credito => "CREDITO",
        }
    }

    pub fn parse(s: &str) -> Option<NormalSide> {
        match s.trim().to_uppercase().as_str() {
            "DEBITO" | "DÉBITO" => Some(Self::Debito),
            "CREDITO" | "CRÉDITO" => Some(Self::Credito),
            _ => None,
        }
    }
}

impl fmt::Display for NormalSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregating (`MADRE`) versus postable (`DETALLE`) account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Madre,
    Detalle,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Madre => "MADRE",
            Self::Detalle => "DETALLE",
        }
    }

    pub fn parse(s: &str) -> Option<AccountType> {
        match s.trim().to_uppercase().as_str() {
            "MADRE" => Some(Self::Madre),
            "DETALLE" => Some(Self::Detalle),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const DEBIT_CLASSES: [char; 5] = ['1', '5', '6', '7', '8'];

/// True when the code is digit-only with a canonical width: 1, 2, 4, 6, or an
/// even length of 8 or more.
pub fn is_valid_code(code: &str) -> bool {
    level(code).is_some()
}

pub fn level(code: &str) -> Option<Level> {
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match code.len() {
        1 => Some(Level::Clase),
        2 => Some(Level::Grupo),
        4 => Some(Level::Cuenta),
        6 => Some(Level::Subcuenta),
        n if n >= 8 && n % 2 == 0 => Some(Level::Detalle),
        _ => None,
    }
}

pub fn parent_code(code: &str) -> Option<String> {
    let parent = level(code)?.parent()?;
    Some(code[..parent.width()].to_string())
}

/// Looks at the class digit only.
pub fn normal_side(code: &str) -> Option<NormalSide> {
    let first = code.chars().next()?;
    if !first.is_ascii_digit() {
        return None;
    }
    if DEBIT_CLASSES.contains(&first) {
        Some(NormalSide::Debito)
    } else {
        Some(NormalSide::Credito)
    }
}

pub fn account_type(level: Level) -> AccountType {
    if level == Level::Detalle {
        AccountType::Detalle
    } else {
        AccountType::Madre
    }
}

/// Leading part of `code` at the width of `target`, when the code reaches it.
///
/// For [`Level::Detalle`] the whole code comes back, since detail codes may be
/// wider than eight digits.
pub fn segment(code: &str, target: Level) -> Option<&str> {
    if !code.bytes().all(|b| b.is_ascii_digit()) || code.len() < target.width() {
        return None;
    }
    match target {
        Level::Detalle => Some(code),
        _ => Some(&code[..target.width()]),
    }
}

/// Sort key that places parents before their children.
pub fn ordering_key(code: &str) -> (u8, &str) {
    (level(code).map_or(u8::MAX, Level::number), code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_code() {
        assert_eq!(level("1"), Some(Level::Clase));
        assert_eq!(parent_code("1"), None);
        assert_eq!(normal_side("1"), Some(NormalSide::Debito));
        assert_eq!(account_type(Level::Clase), AccountType::Madre);
    }

    #[test]
    fn test_cuenta_code() {
        assert_eq!(level("2105"), Some(Level::Cuenta));
        assert_eq!(level("2105").unwrap().label(), "Cuenta");
        assert_eq!(normal_side("2105"), Some(NormalSide::Credito));
        assert_eq!(parent_code("2105").as_deref(), Some("21"));
    }

    #[test]
    fn test_subcuenta_code() {
        assert_eq!(level("110501"), Some(Level::Subcuenta));
        assert_eq!(normal_side("110501"), Some(NormalSide::Debito));
        assert_eq!(parent_code("110501").as_deref(), Some("1105"));
    }

    #[test]
    fn test_detail_codes() {
        assert_eq!(level("11050501"), Some(Level::Detalle));
        assert_eq!(parent_code("11050501").as_deref(), Some("110505"));
        assert_eq!(level("1105050101"), Some(Level::Detalle));
        assert_eq!(parent_code("1105050101").as_deref(), Some("110505"));
        assert_eq!(account_type(Level::Detalle), AccountType::Detalle);
    }

    #[test]
    fn test_parent_prefix_widths() {
        for (code, parent) in [("11", "1"), ("1105", "11"), ("110505", "1105")] {
            assert_eq!(parent_code(code).as_deref(), Some(parent), "code {code}");
            let child = level(code).unwrap();
            assert_eq!(level(parent).unwrap().number(), child.number() - 1);
        }
    }

    #[test]
    fn test_non_canonical_lengths_rejected() {
        for code in ["", "123", "12345", "1234567", "123456789", "12a4", " 1", "-1"] {
            assert!(!is_valid_code(code), "{code:?} should be invalid");
            assert_eq!(parent_code(code), None);
        }
    }

    #[test]
    fn test_normal_side_by_first_digit() {
        for d in '0'..='9' {
            let code = format!("{d}105");
            let expected = if "15678".contains(d) {
                NormalSide::Debito
            } else {
                NormalSide::Credito
            };
            assert_eq!(normal_side(&code), Some(expected), "class {d}");
        }
        assert_eq!(normal_side(""), None);
    }

    #[test]
    fn test_segment() {
        assert_eq!(segment("110501", Level::Clase), Some("1"));
        assert_eq!(segment("110501", Level::Grupo), Some("11"));
        assert_eq!(segment("110501", Level::Cuenta), Some("1105"));
        assert_eq!(segment("110501", Level::Subcuenta), Some("110501"));
        assert_eq!(segment("110501", Level::Detalle), None);
        assert_eq!(segment("1105050101", Level::Detalle), Some("1105050101"));
        assert_eq!(segment("1", Level::Grupo), None);
    }

    #[test]
    fn test_ordering_key_puts_parents_first() {
        let mut codes = vec!["110505", "1105", "1", "11", "11050501"];
        codes.sort_by(|a, b| ordering_key(a).cmp(&ordering_key(b)));
        assert_eq!(codes, vec!["1", "11", "1105", "110505", "11050501"]);
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!(NormalSide::parse("débito"), Some(NormalSide::Debito));
        assert_eq!(AccountType::parse("detalle"), Some(AccountType::Detalle));
        assert_eq!(Level::from_number(6), None);
    }
}
