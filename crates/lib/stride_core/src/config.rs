//! Environment tunables.
//!
//! Values are read through a lookup function so configs can be built from
//! any key/value source; `from_env` constructors pass `std::env::var`.

use tracing::warn;

/// Upper bound for minute-valued tunables: one week.
pub const MAX_TUNABLE_MINUTES: i64 = 7 * 24 * 60;

/// Upper bound for second-valued tunables: one week.
pub const MAX_TUNABLE_SECS: i64 = MAX_TUNABLE_MINUTES * 60;

/// Lookup function over environment variables.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Parse a non-negative integer tunable, clamped to `max`.
///
/// Missing, unparsable or negative values fall back to `default`.
pub fn tunable<F>(lookup: &F, name: &str, default: i64, max: i64) -> i64
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return default;
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if v < 0 => {
            warn!(name, value = v, default, "negative tunable ignored");
            default
        }
        Ok(v) if v > max => {
            warn!(name, value = v, max, "tunable clamped");
            max
        }
        Ok(v) => v,
        Err(_) => {
            warn!(name, value = %raw, default, "unparsable tunable ignored");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn missing_value_uses_default() {
        assert_eq!(tunable(&vars(&[]), "X", 7, 100), 7);
    }

    #[test]
    fn parses_trimmed_value() {
        assert_eq!(tunable(&vars(&[("X", " 42 ")]), "X", 7, 100), 42);
    }

    #[test]
    fn negative_and_garbage_fall_back() {
        assert_eq!(tunable(&vars(&[("X", "-3")]), "X", 7, 100), 7);
        assert_eq!(tunable(&vars(&[("X", "ten")]), "X", 7, 100), 7);
        assert_eq!(tunable(&vars(&[("X", "99999999999999999999999")]), "X", 7, 100), 7);
    }

    #[test]
    fn large_value_is_clamped() {
        assert_eq!(
            tunable(&vars(&[("X", "1000000000000")]), "X", 7, MAX_TUNABLE_MINUTES),
            MAX_TUNABLE_MINUTES
        );
    }

    #[test]
    fn env_lookup_misses_unset_variable() {
        assert_eq!(env_lookup("STRIDE_TEST_SURELY_UNSET_VARIABLE"), None);
    }
}
