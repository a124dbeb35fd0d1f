//! Environment variable substitution for config file processing.
//!
//! Applied to the raw YAML text before deserialization, so every
//! string-typed config value gets `${VAR}` expansion for free.

use regex::Regex;
use std::sync::LazyLock;

/// Regex pattern for matching `${VAR_NAME}` or `${VAR_NAME:-default_value}` syntax.
/// Compiled once at startup using LazyLock to avoid recompiling on every substitution call.
static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-((?:[^}\\]|\\.)*))?}")
        .expect("env-var substitution regex is a compile-time constant and must be valid")
});

/// Substitute `${VAR_NAME}` patterns in a string with environment variable values.
///
/// - `${VAR}` is replaced with the value of the environment variable `VAR`.
/// - If the variable is not set, the `${VAR}` placeholder is left unchanged.
/// - `$${VAR}` (doubled dollar sign) is an escape and produces the literal `${VAR}`.
/// - Supports `${VAR:-default}` syntax for providing a default value when the
///   variable is unset. A `\}` inside the default produces a literal `}`.
pub fn substitute_variables(input: &str) -> String {
    // First, replace escaped `$${` with a placeholder that won't match the regex
    let escaped_placeholder = "\x00ESC_DOLLAR\x00";
    let working = input.replace("$${", escaped_placeholder);

    let result = ENV_VAR_PATTERN.replace_all(&working, |caps: &regex::Captures| {
        let var_name = &caps[1];
        match std::env::var(var_name) {
            Ok(val) => val,
            Err(_) => {
                // Use default value if provided, otherwise leave the placeholder as-is
                caps.get(2)
                    .map(|m| m.as_str().replace("\\}", "}"))
                    .unwrap_or_else(|| caps[0].to_string())
            }
        }
    });

    // Restore escaped dollar signs
    result.replace(escaped_placeholder, "${")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_set_variable() {
        // SAFETY: `std::env::set_var` / `remove_var` are `unsafe` in Rust 2024 because
        // they are not thread-safe. This is acceptable in test code because each test
        // in this module uses a unique, test-specific variable name that no other
        // concurrently-executing test reads, and the variable is unset again at the
        // end of the test body.
        unsafe {
            std::env::set_var("SKIFF_TEST_VAR_SET", "hello");
        }
        let out = substitute_variables("value: ${SKIFF_TEST_VAR_SET}");
        assert_eq!(out, "value: hello");
        // SAFETY: see set_var comment above.
        unsafe {
            std::env::remove_var("SKIFF_TEST_VAR_SET");
        }
    }

    #[test]
    fn unset_variable_left_unchanged() {
        let out = substitute_variables("value: ${SKIFF_TEST_VAR_UNSET}");
        assert_eq!(out, "value: ${SKIFF_TEST_VAR_UNSET}");
    }

    #[test]
    fn unset_variable_uses_default() {
        let out = substitute_variables("value: ${SKIFF_TEST_VAR_DEFAULTED:-fallback}");
        assert_eq!(out, "value: fallback");
    }

    #[test]
    fn set_variable_wins_over_default() {
        // SAFETY: unique test-specific variable, unset at the end of the test body.
        unsafe {
            std::env::set_var("SKIFF_TEST_VAR_BOTH", "real");
        }
        let out = substitute_variables("value: ${SKIFF_TEST_VAR_BOTH:-fallback}");
        assert_eq!(out, "value: real");
        // SAFETY: see set_var comment above.
        unsafe {
            std::env::remove_var("SKIFF_TEST_VAR_BOTH");
        }
    }

    #[test]
    fn escaped_dollar_produces_literal() {
        let out = substitute_variables("value: $${NOT_A_VAR}");
        assert_eq!(out, "value: ${NOT_A_VAR}");
    }

    #[test]
    fn escaped_brace_in_default() {
        let out = substitute_variables("value: ${SKIFF_TEST_VAR_BRACE:-a\\}b}");
        assert_eq!(out, "value: a}b");
    }
}
