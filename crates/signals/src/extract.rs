use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Shortest printable run kept by [`extract_printable_runs`] by default.
pub const DEFAULT_MIN_RUN_LEN: usize = 4;

/// Shortest token kept by [`tokenize`].
pub const MIN_TOKEN_LEN: usize = 4;

// Identifiers are matched against whole alphanumeric words, so the patterns are anchored.
static PART_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:0[0-9A-Z][0-9A-Z]{8,}|03L9[0-9]{6}[A-Z]{0,2}|0769[0-9]{6}[A-Z]{0,2})$")
        .unwrap_or_else(|err| unreachable!("part number pattern: {err}"))
});

static SOFTWARE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^1037[0-9]{4,}$").unwrap_or_else(|err| unreachable!("software id pattern: {err}"))
});

/// Collect runs of printable ASCII (`0x20..=0x7e`) at least `min_len` bytes long.
pub fn extract_printable_runs(bytes: &[u8], min_len: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = None;

    for (idx, byte) in bytes.iter().enumerate() {
        let printable = (32..=126).contains(byte);
        match (printable, start) {
            (true, None) => start = Some(idx),
            (false, Some(run_start)) => {
                push_run(&mut out, &bytes[run_start..idx], min_len);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(run_start) = start {
        push_run(&mut out, &bytes[run_start..], min_len);
    }

    out
}

fn push_run(out: &mut Vec<String>, run: &[u8], min_len: usize) {
    if run.len() >= min_len {
        // Printable ASCII is always valid UTF-8.
        out.push(run.iter().map(|&b| b as char).collect());
    }
}

/// Split on anything that is not an ASCII letter or digit and keep lower-cased
/// pieces of at least [`MIN_TOKEN_LEN`] characters.
pub fn tokenize<S: AsRef<str>>(strings: &[S]) -> BTreeSet<String> {
    strings
        .iter()
        .flat_map(|s| alnum_words(s.as_ref()))
        .filter(|word| word.len() >= MIN_TOKEN_LEN)
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Part numbers as found (original case). Callers lower-case before storing.
pub fn extract_part_numbers<S: AsRef<str>>(strings: &[S]) -> BTreeSet<String> {
    matching_words(strings, &PART_NUMBER)
}

/// Software ids: `1037` followed by at least four digits.
pub fn extract_software_ids<S: AsRef<str>>(strings: &[S]) -> BTreeSet<String> {
    matching_words(strings, &SOFTWARE_ID)
}

fn matching_words<S: AsRef<str>>(strings: &[S], pattern: &Regex) -> BTreeSet<String> {
    strings
        .iter()
        .flat_map(|s| alnum_words(s.as_ref()))
        .filter(|word| pattern.is_match(word))
        .map(str::to_string)
        .collect()
}

fn alnum_words(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn printable_runs_respect_min_length_and_terminators() {
        let bytes = b"\x00ABCD\x01xy\x02EFGHIJ\xffKLM";
        assert_eq!(extract_printable_runs(bytes, 4), vec!["ABCD", "EFGHIJ"]);
        assert_eq!(extract_printable_runs(bytes, 2), vec!["ABCD", "xy", "EFGHIJ", "KLM"]);
    }

    #[test]
    fn printable_run_at_end_of_buffer_is_kept() {
        assert_eq!(extract_printable_runs(b"\x00\x00TAIL", 4), vec!["TAIL"]);
        assert!(extract_printable_runs(b"", 4).is_empty());
    }

    #[test]
    fn tokenize_splits_on_underscore_and_dash() {
        let tokens = tokenize(&["ECU_1037508389 part 03L907309A", "EDC17-C46 abc"]);
        assert_eq!(tokens, set(&["03l907309a", "1037508389", "edc17", "part"]));
    }

    #[test]
    fn classifies_identifiers_from_mixed_text() {
        let input = ["ECU_1037508389 part 03L907309A"];
        assert_eq!(extract_software_ids(&input), set(&["1037508389"]));
        assert_eq!(extract_part_numbers(&input), set(&["03L907309A"]));
    }

    #[test]
    fn part_number_patterns() {
        let input = ["0769123456 03L9123456AB 0A12345678 01234567 03L912345ABC"];
        let found = extract_part_numbers(&input);
        assert!(found.contains("0769123456"));
        assert!(found.contains("03L9123456AB"));
        assert!(found.contains("0A12345678"));
        // Too short for any pattern.
        assert!(!found.contains("01234567"));
        // Still a generic `0` + alnum run.
        assert!(found.contains("03L912345ABC"));
    }

    #[test]
    fn part_numbers_are_case_insensitive_and_verbatim() {
        let found = extract_part_numbers(&["sw 03l907309ab"]);
        assert_eq!(found, set(&["03l907309ab"]));
    }

    #[test]
    fn software_ids_must_be_whole_words() {
        assert!(extract_software_ids(&["x1037508389"]).is_empty());
        assert!(extract_software_ids(&["1037123"]).is_empty());
        assert_eq!(extract_software_ids(&["id:1037123456;"]), set(&["1037123456"]));
    }

    proptest! {
        #[test]
        fn tokens_are_lowercase_and_long_enough(input in "[ -~]{0,64}") {
            for token in tokenize(&[input]) {
                prop_assert!(token.len() >= MIN_TOKEN_LEN);
                prop_assert!(token.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
            }
        }

        #[test]
        fn printable_input_is_one_run(input in "[ -~]{4,64}") {
            prop_assert_eq!(extract_printable_runs(input.as_bytes(), 4), vec![input]);
        }
    }
}
