//! Build-variable comparator for branch conditions.
//!
//! A condition is exactly three tokens: `<operand> <op> <operand>`.
//! Operands starting with `$` are looked up in the build variables;
//! `3.8` parses as a float, `3i` as an explicit int, everything else is
//! a string. Numbers compare numerically, strings lexically; comparing a
//! number to a string is an authoring error.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::branch::ConditionTester;
use crate::error::{PackError, PackResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Operand {
    pub fn parse(token: &str) -> Operand {
        if let Some(raw) = token.strip_suffix('i') {
            if let Ok(n) = raw.parse::<i64>() {
                return Operand::Int(n);
            }
        }
        if let Ok(n) = token.parse::<i64>() {
            return Operand::Int(n);
        }
        if let Ok(f) = token.parse::<f64>() {
            return Operand::Float(f);
        }
        Operand::Str(token.to_string())
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Operand::Int(n) => Some(*n as f64),
            Operand::Float(f) => Some(*f),
            Operand::Str(_) => None,
        }
    }
}

/// Compares operands under a set of named build variables
/// (e.g. `python_version`).
pub struct Comparator {
    vars: HashMap<String, String>,
}

impl Comparator {
    pub fn new(vars: HashMap<String, String>) -> Self {
        Comparator { vars }
    }

    pub fn check(&self, lhs: &str, op: &str, rhs: &str) -> PackResult<bool> {
        let lhs = self.resolve(lhs)?;
        let rhs = self.resolve(rhs)?;
        let ord = compare(&lhs, &rhs)
            .ok_or_else(|| PackError::BadCondition(format!("{:?} {} {:?}", lhs, op, rhs)))?;
        match op {
            "<" => Ok(ord == Ordering::Less),
            "<=" => Ok(ord != Ordering::Greater),
            "==" => Ok(ord == Ordering::Equal),
            ">=" => Ok(ord != Ordering::Less),
            ">" => Ok(ord == Ordering::Greater),
            _ => Err(PackError::BadCondition(format!("unknown operator '{}'", op))),
        }
    }

    fn resolve(&self, token: &str) -> PackResult<Operand> {
        if let Some(name) = token.strip_prefix('$') {
            let value = self
                .vars
                .get(name)
                .ok_or_else(|| PackError::BadCondition(format!("unknown variable '${}'", name)))?;
            Ok(Operand::parse(value))
        } else {
            Ok(Operand::parse(token))
        }
    }
}

fn compare(lhs: &Operand, rhs: &Operand) -> Option<Ordering> {
    match (lhs, rhs) {
        (Operand::Str(a), Operand::Str(b)) => Some(a.cmp(b)),
        _ => {
            let a = lhs.as_float()?;
            let b = rhs.as_float()?;
            a.partial_cmp(&b)
        }
    }
}

impl ConditionTester for Comparator {
    fn test(&self, args: &[String]) -> PackResult<bool> {
        if args.len() != 3 {
            return Err(PackError::BadCondition(format!(
                "expected '<lhs> <op> <rhs>', got {:?}",
                args
            )));
        }
        self.check(&args[0], &args[1], &args[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp() -> Comparator {
        let mut vars = HashMap::new();
        vars.insert("python_version".to_string(), "3.8".to_string());
        Comparator::new(vars)
    }

    #[test]
    fn test_numeric_ordering() {
        let c = cmp();
        assert!(!c.check("2.0", "<", "2.0").unwrap());
        assert!(c.check("2.0", "<=", "2.0").unwrap());
        assert!(c.check("2.0", "==", "2.0").unwrap());
        assert!(c.check("2.0", ">=", "2.0").unwrap());
        assert!(!c.check("2.0", ">", "2.0").unwrap());

        assert!(c.check("2.0", "<", "2.1").unwrap());
        assert!(!c.check("2.1", "<=", "2.0").unwrap());
        assert!(c.check("2.1", ">", "2.0").unwrap());
    }

    #[test]
    fn test_numeric_is_not_lexical() {
        // "10" < "9" lexically, but these are numbers
        assert!(cmp().check("10", ">", "9").unwrap());
    }

    #[test]
    fn test_int_suffix() {
        assert_eq!(Operand::parse("3i"), Operand::Int(3));
        assert_eq!(Operand::parse("3.8"), Operand::Float(3.8));
        assert_eq!(Operand::parse("abc"), Operand::Str("abc".to_string()));
        assert!(cmp().check("3i", "==", "3.0").unwrap());
    }

    #[test]
    fn test_variable_substitution() {
        let c = cmp();
        assert!(c.check("$python_version", ">=", "3.6").unwrap());
        assert!(!c.check("$python_version", ">=", "3.9").unwrap());
        assert!(c.check("$python_version", "==", "3.8").unwrap());
    }

    #[test]
    fn test_unknown_variable_is_fatal() {
        assert!(matches!(
            cmp().check("$nope", "==", "1"),
            Err(PackError::BadCondition(_))
        ));
    }

    #[test]
    fn test_string_ordering() {
        let c = cmp();
        assert!(c.check("alpha", "<", "beta").unwrap());
        assert!(c.check("alpha", "==", "alpha").unwrap());
    }

    #[test]
    fn test_mixed_operands_rejected() {
        assert!(matches!(
            cmp().check("3.0", "<", "alpha"),
            Err(PackError::BadCondition(_))
        ));
    }
}
