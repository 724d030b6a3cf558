//! Artifact naming and version arithmetic.
//!
//! Artifacts are named `<localeTag>_<version>.json`. The version of a remote
//! object is the run of digits immediately before its trailing `.json`; names
//! without one are ignored. The next version is `max + 1`, starting at 1.

use std::sync::OnceLock;

use regex::Regex;

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\.json$").expect("static regex"))
}

fn artifact_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_\d+\.json$").expect("static regex"))
}

/// `parse_version("en_EN_12.json") == Some(12)`.
pub fn parse_version(name: &str) -> Option<u64> {
    version_pattern()
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
}

/// Highest version among `names`, or 0 when none carries one.
pub fn latest_version<'a, I>(names: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().filter_map(parse_version).max().unwrap_or(0)
}

pub fn next_version<'a, I>(names: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    latest_version(names) + 1
}

pub fn artifact_name(locale: &str, version: u64) -> String {
    format!("{locale}_{version}.json")
}

/// True for any file named like a versioned artifact (`..._<digits>.json`).
pub fn is_versioned_artifact(file_name: &str) -> bool {
    artifact_pattern().is_match(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trailing_digits() {
        assert_eq!(parse_version("en_EN_12.json"), Some(12));
        assert_eq!(parse_version("i18n/fr_FR_5.json"), Some(5));
    }

    #[test]
    fn non_matching_names_yield_none() {
        assert_eq!(parse_version("README.md"), None);
        assert_eq!(parse_version("fr_FR.json"), None);
        assert_eq!(parse_version("fr_FR_5.json.bak"), None);
        assert_eq!(parse_version("fr_FR_99999999999999999999999.json"), None);
    }

    #[test]
    fn next_version_is_max_plus_one() {
        assert_eq!(next_version(["a_3.json", "b_7.json", "c_1.json"]), 8);
        assert_eq!(next_version(["notes.txt"]), 1);
        assert_eq!(next_version(Vec::<&str>::new()), 1);
    }

    #[test]
    fn artifact_pattern_matches_any_versioned_json() {
        assert_eq!(artifact_name("fr_FR", 6), "fr_FR_6.json");
        assert!(is_versioned_artifact("fr_FR_6.json"));
        assert!(is_versioned_artifact("notes_99.json"));
        assert!(!is_versioned_artifact("package.json"));
        assert!(!is_versioned_artifact("fr_FR_6.json.tmp"));
    }
}
