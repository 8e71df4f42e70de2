use crate::extract::{extract_part_numbers, extract_software_ids, tokenize};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Keywords whose lines carry identifying text in a calibration description.
pub const DESCRIPTION_KEYWORDS: &[&str] =
    &["PROJECT", "MODULE", "VERSION", "ECU", "USER", "FUNCTION"];

static QUOTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(.*?)""#).unwrap_or_else(|err| unreachable!("quoted pattern: {err}"))
});

static KEYWORD_LINE: Lazy<Regex> = Lazy::new(|| {
    let alternatives = DESCRIPTION_KEYWORDS.join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternatives})\b"))
        .unwrap_or_else(|err| unreachable!("keyword pattern: {err}"))
});

/// Quoted substrings followed by every line that mentions a description keyword.
pub fn collect_description_strings(text: &str) -> Vec<String> {
    let quoted = QUOTED
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    let keyword_lines = text
        .lines()
        .filter(|line| KEYWORD_LINE.is_match(line))
        .map(str::to_string);

    quoted.chain(keyword_lines).collect()
}

/// Identifier sets carried by a description entry. Part numbers and software
/// ids are stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionSignals {
    pub identifiers: BTreeSet<String>,
    pub part_numbers: BTreeSet<String>,
    pub software_ids: BTreeSet<String>,
}

impl DescriptionSignals {
    /// Signals from the body of a description file.
    pub fn from_description_text(text: &str) -> Self {
        Self::from_strings(&collect_description_strings(text))
    }

    /// Signals from a sidecar metadata file; the whole text is considered.
    pub fn from_sidecar_text(text: &str) -> Self {
        Self::from_strings(&[text])
    }

    pub fn from_strings<S: AsRef<str>>(strings: &[S]) -> Self {
        Self {
            identifiers: tokenize(strings),
            part_numbers: lowercase(extract_part_numbers(strings)),
            software_ids: lowercase(extract_software_ids(strings)),
        }
    }

    pub fn merge(&mut self, other: DescriptionSignals) {
        self.identifiers.extend(other.identifiers);
        self.part_numbers.extend(other.part_numbers);
        self.software_ids.extend(other.software_ids);
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty() && self.part_numbers.is_empty() && self.software_ids.is_empty()
    }
}

fn lowercase(items: BTreeSet<String>) -> BTreeSet<String> {
    items.into_iter().map(|s| s.to_ascii_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"ASAP2_VERSION 1 60
/begin PROJECT EDC17C46 "VW 2.0 TDI"
  /begin MODULE CR_03L906018AB "Software 1037508389"
    /begin CHARACTERISTIC AccPed_trqEngHiGs_MAP "Accelerator map"
  /end MODULE
/end PROJECT
"#;

    #[test]
    fn collects_quoted_strings_then_keyword_lines() {
        let strings = collect_description_strings(SAMPLE);
        assert_eq!(strings[0], "VW 2.0 TDI");
        assert_eq!(strings[1], "Software 1037508389");
        assert_eq!(strings[2], "Accelerator map");
        assert!(strings.iter().any(|s| s.contains("/begin PROJECT EDC17C46")));
        assert!(strings.iter().any(|s| s.trim() == "/end MODULE"));
        // `ASAP2_VERSION` has no word boundary before VERSION.
        assert!(!strings.iter().any(|s| s.starts_with("ASAP2_VERSION")));
    }

    #[test]
    fn description_signals_are_lowercased() {
        let signals = DescriptionSignals::from_description_text(SAMPLE);
        assert!(signals.identifiers.contains("edc17c46"));
        assert!(signals.identifiers.contains("accelerator"));
        assert!(signals.software_ids.contains("1037508389"));
        assert!(signals.part_numbers.contains("03l906018ab"));
    }

    #[test]
    fn merge_unions_all_sets() {
        let mut base = DescriptionSignals::from_description_text(SAMPLE);
        let sidecar = DescriptionSignals::from_sidecar_text("EPK: 0769123456 SW 1037999999");
        base.merge(sidecar);

        assert!(base.part_numbers.contains("0769123456"));
        assert!(base.software_ids.contains("1037999999"));
        assert!(base.software_ids.contains("1037508389"));
    }

    #[test]
    fn empty_text_has_no_signals() {
        assert!(DescriptionSignals::from_description_text("").is_empty());
    }
}
