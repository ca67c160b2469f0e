//! Engine configuration.
//!
//! A [`TerminalConfig`] fixes the initial viewport, the tab expansion width,
//! and an optional scrollback cap. Values can be read from `SHTERM_*`
//! environment variables; parsing never fails hard, it records diagnostics
//! and keeps the default for the offending field.

use std::env;
use std::fmt;

/// Environment variable for the initial viewport height.
pub const ENV_ROWS: &str = "SHTERM_ROWS";
/// Environment variable for the initial viewport width.
pub const ENV_COLS: &str = "SHTERM_COLS";
/// Environment variable for the number of spaces a tab expands to.
pub const ENV_TAB_WIDTH: &str = "SHTERM_TAB_WIDTH";
/// Environment variable for the scrollback cap (`0` or `unlimited` disables it).
pub const ENV_SCROLLBACK: &str = "SHTERM_SCROLLBACK";

/// Default viewport height.
pub const DEFAULT_ROWS: u16 = 24;
/// Default viewport width.
pub const DEFAULT_COLS: u16 = 80;
/// Default tab expansion width.
pub const DEFAULT_TAB_WIDTH: u16 = 4;
/// Largest accepted tab expansion width.
pub const MAX_TAB_WIDTH: u16 = 16;

/// Terminal engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TerminalConfig {
    /// Viewport height in rows.
    pub rows: u16,
    /// Viewport width in columns.
    pub cols: u16,
    /// Spaces emitted per tab (`\t` and `CSI I`).
    pub tab_width: u16,
    /// Maximum number of lines kept above the viewport. `None` keeps all.
    pub scrollback_limit: Option<usize>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            tab_width: DEFAULT_TAB_WIDTH,
            scrollback_limit: None,
        }
    }
}

/// Configuration parse diagnostics (env + validation).
#[derive(Debug, Clone)]
pub struct TerminalConfigParse {
    pub config: TerminalConfig,
    pub errors: Vec<ConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl TerminalConfig {
    /// Config with the given viewport and defaults elsewhere.
    #[must_use]
    pub fn with_size(rows: u16, cols: u16) -> Self {
        Self {
            rows,
            cols,
            ..Self::default()
        }
    }

    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> TerminalConfig {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> TerminalConfigParse {
        from_env_with(|key| env::var(key).ok())
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        validate_positive("rows", self.rows, &mut errors);
        validate_positive("cols", self.cols, &mut errors);
        if self.tab_width == 0 || self.tab_width > MAX_TAB_WIDTH {
            errors.push(ConfigError::new(
                "tab_width",
                self.tab_width.to_string(),
                format!("must be in 1..={MAX_TAB_WIDTH}"),
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn from_env_with<F>(mut get: F) -> TerminalConfigParse
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = TerminalConfig::default();
    let mut errors = Vec::new();

    if let Some(value) = get(ENV_ROWS) {
        match parse_u16(&value) {
            Some(parsed) => config.rows = parsed,
            None => errors.push(ConfigError::new("rows", value, "expected positive integer")),
        }
    }

    if let Some(value) = get(ENV_COLS) {
        match parse_u16(&value) {
            Some(parsed) => config.cols = parsed,
            None => errors.push(ConfigError::new("cols", value, "expected positive integer")),
        }
    }

    if let Some(value) = get(ENV_TAB_WIDTH) {
        match parse_u16(&value) {
            Some(parsed) => config.tab_width = parsed,
            None => errors.push(ConfigError::new(
                "tab_width",
                value,
                "expected positive integer",
            )),
        }
    }

    if let Some(value) = get(ENV_SCROLLBACK) {
        match parse_scrollback(&value) {
            Some(parsed) => config.scrollback_limit = parsed,
            None => errors.push(ConfigError::new(
                "scrollback_limit",
                value,
                "expected integer or 'unlimited'",
            )),
        }
    }

    if let Err(invalid) = config.validate() {
        // Keep the engine usable: fall back field by field.
        for err in &invalid {
            match err.field {
                "rows" => config.rows = DEFAULT_ROWS,
                "cols" => config.cols = DEFAULT_COLS,
                "tab_width" => config.tab_width = DEFAULT_TAB_WIDTH,
                _ => {}
            }
        }
        errors.extend(invalid);
    }

    #[cfg(feature = "tracing")]
    for err in &errors {
        crate::warn!(field = err.field, value = %err.value, "invalid terminal config: {}", err.message);
    }

    TerminalConfigParse { config, errors }
}

fn validate_positive(field: &'static str, value: u16, errors: &mut Vec<ConfigError>) {
    if value == 0 {
        errors.push(ConfigError::new(field, value.to_string(), "must be >= 1"));
    }
}

#[inline]
fn parse_u16(value: &str) -> Option<u16> {
    value.trim().parse::<u16>().ok()
}

fn parse_scrollback(value: &str) -> Option<Option<usize>> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("unlimited") {
        return Some(None);
    }
    match value.parse::<usize>().ok()? {
        0 => Some(None),
        n => Some(Some(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(pairs: &[(&'static str, &str)]) -> TerminalConfigParse {
        let env: HashMap<&str, String> = pairs
            .iter()
            .map(|(key, value)| (*key, (*value).to_string()))
            .collect();
        from_env_with(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_match_classic_terminal() {
        let config = TerminalConfig::default();
        assert_eq!(config.rows, 24);
        assert_eq!(config.cols, 80);
        assert_eq!(config.tab_width, 4);
        assert_eq!(config.scrollback_limit, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_apply() {
        let parsed = parse(&[
            (ENV_ROWS, "40"),
            (ENV_COLS, " 132 "),
            (ENV_TAB_WIDTH, "8"),
            (ENV_SCROLLBACK, "1000"),
        ]);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.config.rows, 40);
        assert_eq!(parsed.config.cols, 132);
        assert_eq!(parsed.config.tab_width, 8);
        assert_eq!(parsed.config.scrollback_limit, Some(1000));
    }

    #[test]
    fn scrollback_unlimited_spellings() {
        assert_eq!(parse(&[(ENV_SCROLLBACK, "0")]).config.scrollback_limit, None);
        assert_eq!(
            parse(&[(ENV_SCROLLBACK, "Unlimited")]).config.scrollback_limit,
            None
        );
    }

    #[test]
    fn unparseable_values_keep_defaults_and_report() {
        let parsed = parse(&[(ENV_ROWS, "tall"), (ENV_SCROLLBACK, "-3")]);
        assert_eq!(parsed.config.rows, DEFAULT_ROWS);
        assert_eq!(parsed.config.scrollback_limit, None);
        let fields: Vec<_> = parsed.errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["rows", "scrollback_limit"]);
    }

    #[test]
    fn invalid_values_fall_back_after_validation() {
        let parsed = parse(&[(ENV_COLS, "0"), (ENV_TAB_WIDTH, "99")]);
        assert_eq!(parsed.config.cols, DEFAULT_COLS);
        assert_eq!(parsed.config.tab_width, DEFAULT_TAB_WIDTH);
        assert_eq!(parsed.errors.len(), 2);
        assert!(parsed.config.validate().is_ok());
    }

    #[test]
    fn validate_reports_every_violation() {
        let config = TerminalConfig {
            rows: 0,
            cols: 0,
            tab_width: 0,
            scrollback_limit: None,
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].to_string(), "rows=0 (must be >= 1)");
    }
}
