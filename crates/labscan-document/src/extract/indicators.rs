// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Indicator definitions and the built-in lab panel catalogue.

use std::sync::LazyLock;

use labscan_core::error::{LabscanError, Result};
use regex::Regex;

/// Numeric token searched for in the window after a label: 1-4 integer
/// digits, optionally a `.` or `,` and 1-3 fractional digits.
pub const VALUE_TOKEN_PATTERN: &str = r"[0-9]{1,4}(?:[.,][0-9]{1,3})?";

static VALUE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(VALUE_TOKEN_PATTERN).expect("value token pattern is valid"));

/// One named field to pull out of recognized text.
#[derive(Debug, Clone)]
pub struct IndicatorSpec {
    name: String,
    /// Finds the label. Group 1 spans the label itself.
    label: Regex,
    /// Tried directly after the label: non-digits, then the captured number.
    dedicated: Option<Regex>,
    /// Searched for inside the window when `dedicated` is absent or fails.
    value_token: Regex,
}

impl IndicatorSpec {
    /// An indicator whose label is its name, matched case-insensitively.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let label = compile_label(&regex::escape(&name))?;
        Ok(Self {
            name,
            label,
            dedicated: None,
            value_token: VALUE_TOKEN.clone(),
        })
    }

    /// Replace the label with a custom pattern (regex syntax, no anchors).
    pub fn with_label(mut self, pattern: &str) -> Result<Self> {
        self.label = compile_label(pattern)?;
        Ok(self)
    }

    /// Add a dedicated value pattern, e.g. `[0-9]{1,2}[.,][0-9]{1,2}`.
    ///
    /// It must match right after the label, separated only by non-digit
    /// characters.
    pub fn with_dedicated(mut self, number_pattern: &str) -> Result<Self> {
        let pattern = format!(r"^[^0-9]*({number_pattern})");
        self.dedicated = Some(compile(&self.name, &pattern)?);
        Ok(self)
    }

    /// Replace the window token pattern.
    pub fn with_value_token(mut self, pattern: &str) -> Result<Self> {
        self.value_token = compile(&self.name, pattern)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_dedicated_pattern(&self) -> bool {
        self.dedicated.is_some()
    }

    /// Byte offset just past the first occurrence of the label, if any.
    pub(crate) fn label_end(&self, text: &str) -> Option<usize> {
        self.label
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|label| label.end())
    }

    pub(crate) fn dedicated(&self) -> Option<&Regex> {
        self.dedicated.as_ref()
    }

    pub(crate) fn value_token(&self) -> &Regex {
        &self.value_token
    }
}

/// Case-insensitive label that does not start glued to a letter, digit or
/// hyphen (`T4` must not fire inside `FT4`, nor `Tg` inside `Anti-Tg`).
fn compile_label(pattern: &str) -> Result<Regex> {
    let full = format!(r"(?i)(?:^|[^\p{{L}}\p{{N}}-])({pattern})");
    Regex::new(&full).map_err(|err| LabscanError::Config(format!("invalid label pattern {pattern:?}: {err}")))
}

fn compile(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|err| LabscanError::Config(format!("invalid pattern for {name}: {err}")))
}

static CATALOGUE: LazyLock<Vec<IndicatorSpec>> = LazyLock::new(|| {
    build_catalogue().expect("built-in indicator patterns are valid")
});

/// The built-in indicator catalogue, in presentation order.
pub fn catalogue() -> &'static [IndicatorSpec] {
    &CATALOGUE
}

/// Names of the built-in indicators, in presentation order.
pub fn known_names() -> impl Iterator<Item = &'static str> {
    CATALOGUE.iter().map(IndicatorSpec::name)
}

fn build_catalogue() -> Result<Vec<IndicatorSpec>> {
    Ok(vec![
        IndicatorSpec::new("FT4")?.with_dedicated(r"[0-9]{1,2}[.,][0-9]{1,2}")?,
        IndicatorSpec::new("FT3")?,
        IndicatorSpec::new("TSH")?.with_dedicated(r"[0-9]{0,2}[.,][0-9]{1,3}")?,
        IndicatorSpec::new("T3")?.with_dedicated(r"[0-9]{1,3}[.,][0-9]{1,2}")?,
        IndicatorSpec::new("T4")?.with_dedicated(r"[0-9]{1,2}[.,][0-9]{1,2}")?,
        IndicatorSpec::new("TPO")?.with_dedicated(r"[0-9]{1,3}[.,][0-9]{1,2}")?,
        IndicatorSpec::new("Anti-Tg")?.with_label(r"anti[\s-]*tg")?,
        IndicatorSpec::new("Tg")?,
        IndicatorSpec::new("Glucose")?,
        IndicatorSpec::new("Protein")?,
    ])
}
