//! Builtin function metadata used by the compiler and evaluator.
use std::ops::RangeInclusive;

/// Return true if the name is a known builtin function.
pub fn is_known_function(name: &str) -> bool {
    arg_count_range(name).is_some()
}

/// Return the allowed argument count range for a builtin, if known.
/// Use inclusive ranges; None means unknown function.
pub fn arg_count_range(name: &str) -> Option<RangeInclusive<usize>> {
    match name {
        "exp" | "ln" | "log" | "log10" | "log2" | "sqrt" | "abs" | "floor" | "ceil" | "round"
        | "sin" | "cos" | "tan" => Some(1..=1),
        "pow" | "min" | "max" => Some(2..=2),
        _ => None,
    }
}

/// Apply a builtin to already-evaluated arguments.
///
/// Arity is checked at compile time, so missing arguments cannot occur here.
pub(crate) fn apply(name: &str, args: &[f64]) -> f64 {
    let a = args.first().copied().unwrap_or(0.0);
    let b = args.get(1).copied().unwrap_or(0.0);
    match name {
        "exp" => a.exp(),
        "ln" | "log" => a.ln(),
        "log10" => a.log10(),
        "log2" => a.log2(),
        "sqrt" => a.sqrt(),
        "abs" => a.abs(),
        "floor" => a.floor(),
        "ceil" => a.ceil(),
        "round" => a.round(),
        "sin" => a.sin(),
        "cos" => a.cos(),
        "tan" => a.tan(),
        "pow" => a.powf(b),
        "min" => a.min(b),
        "max" => a.max(b),
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity() {
        assert_eq!(arg_count_range("exp"), Some(1..=1));
        assert_eq!(arg_count_range("max"), Some(2..=2));
        assert!(!is_known_function("gamma"));
    }

    #[test]
    fn test_apply() {
        assert_eq!(apply("max", &[-1.0, 0.0]), 0.0);
        assert_eq!(apply("pow", &[2.0, 10.0]), 1024.0);
        assert!(apply("unknown", &[1.0]).is_nan());
    }
}
