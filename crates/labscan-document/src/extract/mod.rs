// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Indicator extraction: turns raw recognized text into an ordered mapping of
// indicator name to value using per-indicator heuristics.
//
// For every indicator, independently:
//
// 1. Find the first occurrence of its label.
// 2. Try the dedicated pattern (non-digits, then a decimal number) right
//    after it.
// 3. Otherwise take the first numeric token in a bounded window after it.
//
// Missing indicators are gaps in the mapping, never errors.

pub mod indicators;

use labscan_core::FieldMapping;
use tracing::{debug, instrument};

pub use indicators::{IndicatorSpec, catalogue, known_names};

/// Characters searched after a label when the dedicated pattern fails.
pub const DEFAULT_WINDOW_CHARS: usize = 100;

/// How a value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPath {
    Dedicated,
    Window,
}

/// Extracts indicator values from recognized text.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    specs: Vec<IndicatorSpec>,
    window_chars: usize,
}

impl FieldExtractor {
    pub fn new(specs: Vec<IndicatorSpec>) -> Self {
        Self {
            specs,
            window_chars: DEFAULT_WINDOW_CHARS,
        }
    }

    /// Change the fallback window, counted in characters.
    pub fn with_window(mut self, window_chars: usize) -> Self {
        self.window_chars = window_chars;
        self
    }

    pub fn specs(&self) -> &[IndicatorSpec] {
        &self.specs
    }

    /// Names this extractor knows, in presentation order.
    pub fn known_names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(IndicatorSpec::name)
    }

    /// Extract every configured indicator from `raw_text`.
    ///
    /// The result always carries `raw_text` under the reserved key.
    #[instrument(skip_all, fields(text_len = raw_text.len(), indicators = self.specs.len()))]
    pub fn extract(&self, raw_text: &str) -> FieldMapping {
        let mut fields = FieldMapping::with_raw_text(raw_text);
        for spec in &self.specs {
            match find_value(spec, raw_text, self.window_chars) {
                Some((value, path)) => {
                    debug!(indicator = spec.name(), value, ?path, "Indicator found");
                    fields.insert(spec.name(), value);
                }
                None => debug!(indicator = spec.name(), "Indicator not found"),
            }
        }
        fields
    }
}

impl Default for FieldExtractor {
    /// The built-in catalogue with a 100 character window.
    fn default() -> Self {
        Self::new(catalogue().to_vec())
    }
}

/// Extract `specs` from `raw_text` with the default window.
pub fn extract(raw_text: &str, specs: &[IndicatorSpec]) -> FieldMapping {
    FieldExtractor::new(specs.to_vec()).extract(raw_text)
}

/// Look up one indicator. Only the first label occurrence is ever considered.
pub fn find_value<'t>(
    spec: &IndicatorSpec,
    text: &'t str,
    window_chars: usize,
) -> Option<(&'t str, MatchPath)> {
    let start = spec.label_end(text)?;
    let rest = &text[start..];

    if let Some(dedicated) = spec.dedicated() {
        if let Some(value) = dedicated.captures(rest).and_then(|caps| caps.get(1)) {
            return Some((value.as_str(), MatchPath::Dedicated));
        }
    }

    let window = &rest[..char_boundary_after(rest, window_chars)];
    spec.value_token()
        .find(window)
        .map(|token| (token.as_str(), MatchPath::Window))
}

/// Byte length of the first `chars` characters of `text`.
fn char_boundary_after(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(offset, _)| offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use labscan_core::RAW_TEXT_KEY;

    fn specs(names: &[&str]) -> Vec<IndicatorSpec> {
        catalogue()
            .iter()
            .filter(|spec| names.contains(&spec.name()))
            .cloned()
            .collect()
    }

    #[test]
    fn reads_values_following_their_labels() {
        let fields = extract("FT4 12.3 TSH 3.1", &specs(&["FT4", "TSH"]));
        assert_eq!(fields.get("FT4"), Some("12.3"));
        assert_eq!(fields.get("TSH"), Some("3.1"));
        assert_eq!(fields.indicator_count(), 2);
    }

    #[test]
    fn text_without_labels_yields_only_raw_text() {
        let text = "Patient name: Nguyen Van A\nDate: 12/03/2024";
        let fields = FieldExtractor::default().extract(text);
        assert_eq!(fields.indicator_count(), 0);
        assert_eq!(fields.get(RAW_TEXT_KEY), Some(text));
    }

    #[test]
    fn lowercase_glued_comma_decimal() {
        let fields = extract("tsh5,2", &specs(&["TSH"]));
        assert_eq!(fields.get("TSH"), Some("5,2"));
    }

    #[test]
    fn window_path_accepts_integers() {
        let spec = IndicatorSpec::new("Glucose").expect("spec");
        assert_eq!(
            find_value(&spec, "Glucose (mg/dL): 95 ref 70-99", DEFAULT_WINDOW_CHARS),
            Some(("95", MatchPath::Window))
        );
    }

    #[test]
    fn dedicated_pattern_wins_over_window() {
        // The window token needs a leading digit and would read "45"; the
        // dedicated TSH pattern allows a bare fraction.
        let tsh = &specs(&["TSH"])[0];
        assert_eq!(
            find_value(tsh, "TSH .45 mIU/L", DEFAULT_WINDOW_CHARS),
            Some((".45", MatchPath::Dedicated))
        );
    }

    #[test]
    fn dedicated_failure_falls_back_to_window() {
        let ft4 = &specs(&["FT4"])[0];
        assert_eq!(
            find_value(ft4, "FT4 12 pmol/L", DEFAULT_WINDOW_CHARS),
            Some(("12", MatchPath::Window))
        );
    }

    #[test]
    fn only_the_first_label_occurrence_counts() {
        let spec = IndicatorSpec::new("Protein").expect("spec");
        let text = format!("Protein {} Protein 7.1", "x".repeat(150));
        assert_eq!(find_value(&spec, &text, DEFAULT_WINDOW_CHARS), None);
    }

    #[test]
    fn window_is_bounded() {
        let spec = IndicatorSpec::new("Protein").expect("spec");
        let near = format!("Protein{}7.1", " ".repeat(90));
        assert_eq!(find_value(&spec, &near, DEFAULT_WINDOW_CHARS), Some(("7.1", MatchPath::Window)));
        let far = format!("Protein{}7.1", " ".repeat(120));
        assert_eq!(find_value(&spec, &far, DEFAULT_WINDOW_CHARS), None);
    }

    #[test]
    fn window_counts_characters_not_bytes() {
        let spec = IndicatorSpec::new("Glucose").expect("spec");
        // 60 two-byte characters exceed 100 bytes but not 100 characters.
        let text = format!("Glucose {}5.4", "đ".repeat(60));
        assert_eq!(find_value(&spec, &text, DEFAULT_WINDOW_CHARS), Some(("5.4", MatchPath::Window)));
    }

    #[test]
    fn separator_is_preserved() {
        let fields = FieldExtractor::default().extract("FT3: 4,61 pg/mL\nTg 1.05");
        assert_eq!(fields.get("FT3"), Some("4,61"));
        assert_eq!(fields.get("Tg"), Some("1.05"));
    }

    #[test]
    fn extractions_are_independent() {
        // Glucose's match does not consume the number, so Protein sees it too.
        let fields = FieldExtractor::default().extract("Glucose Protein 6.8");
        assert_eq!(fields.get("Glucose"), Some("6.8"));
        assert_eq!(fields.get("Protein"), Some("6.8"));
    }

    #[test]
    fn results_follow_catalogue_order() {
        let fields = FieldExtractor::default().extract("Glucose 5.6 TSH 2.2 FT4 11.0");
        let names: Vec<_> = fields.indicators().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["FT4", "TSH", "Glucose"]);
    }

    #[test]
    fn malformed_text_never_panics() {
        let extractor = FieldExtractor::default();
        for text in ["", "TSH", "FT4 .", "tsh ,,,,", "\u{0}\u{FFFF}FT4", "Anti-", "đđđ TSH đ"] {
            let fields = extractor.extract(text);
            assert_eq!(fields.raw_text(), Some(text));
        }
    }

    #[test]
    fn vietnamese_report_excerpt() {
        let text = "KẾT QUẢ XÉT NGHIỆM\nFT4: 14,2 pmol/L (12 - 22)\nTSH : 0,87 µIU/mL\nAnti-Tg 12.5 IU/mL\nGlucose 5.4 mmol/L";
        let fields = FieldExtractor::default().extract(text);
        assert_eq!(fields.get("FT4"), Some("14,2"));
        assert_eq!(fields.get("TSH"), Some("0,87"));
        assert_eq!(fields.get("Anti-Tg"), Some("12.5"));
        assert_eq!(fields.get("Glucose"), Some("5.4"));
        assert!(!fields.contains("Tg"));
    }
}
