//! Name normalization and composite keys.
//!
//! Characters are identified only by display names typed on different sheets,
//! so every comparison in the graph goes through [`normalize`]. The title
//! stripping is deliberately blunt: it removes the fragments anywhere, so
//! "mother" becomes "mor". Matching depends on that exact behavior.

use serde_json::Value;
use sheet_records::CharacterRecord;

/// Fragments removed wherever they occur after lowercasing.
const STRIPPED_FRAGMENTS: [&str; 3] = ["the", "lady", "sir"];

/// Separator placed between candidate names so they cannot run together.
pub const NAME_SEPARATOR: &str = "|";

/// Canonicalize a display name.
///
/// Lowercases, removes every occurrence of "the", "lady" and "sir", then
/// removes all whitespace. The strip pass repeats until nothing changes, so
/// fragments that only appear after a removal (e.g. "t he") are removed too
/// and `normalize(normalize(x)) == normalize(x)` holds for every input.
pub fn normalize(input: &str) -> String {
    let mut current = input.to_lowercase();
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_once(input: &str) -> String {
    let mut output = input.to_string();
    for fragment in STRIPPED_FRAGMENTS {
        output = output.replace(fragment, "");
    }
    output.retain(|c| !c.is_whitespace());
    output
}

/// [`normalize`] for untyped data: strings and numbers are normalized,
/// anything else yields `""`.
pub fn normalize_value(input: &Value) -> String {
    match input {
        Value::String(s) => normalize(s),
        Value::Number(n) => normalize(&n.to_string()),
        _ => String::new(),
    }
}

/// Collect the display names an entity may be referred to by.
///
/// Primary name first, then the real name, then the presented instance's
/// name. Blank names and exact duplicates are dropped; first-seen order wins.
pub fn candidate_names(record: &CharacterRecord, presented_as: Option<&str>) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(3);
    let candidates = [
        Some(record.name.as_str()),
        record.real_name.as_deref(),
        presented_as,
    ];

    for name in candidates.into_iter().flatten() {
        let name = name.trim();
        if !name.is_empty() && !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }

    names
}

/// Build the normalized lookup key for an entity, optionally as presented by a token.
pub fn composite_key(record: &CharacterRecord, presented_as: Option<&str>) -> String {
    let names = candidate_names(record, presented_as);
    if names.is_empty() {
        return String::new();
    }
    normalize(&names.join(NAME_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_titles_case_and_whitespace() {
        assert_eq!(normalize("The Beacon"), normalize("BEACON"));
        assert_eq!(normalize("BEACON"), normalize("beacon"));
        assert_eq!(normalize("beacon"), "beacon");
    }

    #[test]
    fn test_normalize_known_values() {
        assert_eq!(normalize("The Lady of the Lake"), "oflake");
        assert_eq!(normalize("SIR KNIGHT"), "knight");
        assert_eq!(normalize("mother"), "mor");
        assert_eq!(normalize("  "), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "The Beacon",
            "Lady Legacy",
            "t he",
            "thsire",
            "Sir Thelonious the Third",
            "Ms. Mother | Beacon",
            "ÉLODIE",
        ];

        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_normalize_value() {
        assert_eq!(normalize_value(&json!("The Beacon")), "beacon");
        assert_eq!(normalize_value(&json!(42)), "42");
        assert_eq!(normalize_value(&json!(1.5)), "1.5");
        assert_eq!(normalize_value(&Value::Null), "");
        assert_eq!(normalize_value(&json!(true)), "");
        assert_eq!(normalize_value(&json!(["Beacon"])), "");
        assert_eq!(normalize_value(&json!({"name": "Beacon"})), "");
    }

    #[test]
    fn test_candidate_names_dedup_in_order() {
        let record = CharacterRecord::new("Beacon").with_real_name("Mara Quill");

        assert_eq!(candidate_names(&record, None), vec!["Beacon", "Mara Quill"]);
        assert_eq!(
            candidate_names(&record, Some("Beacon")),
            vec!["Beacon", "Mara Quill"]
        );
        assert_eq!(
            candidate_names(&record, Some("Lamp")),
            vec!["Beacon", "Mara Quill", "Lamp"]
        );

        let same = CharacterRecord::new("Legacy").with_real_name("Legacy");
        assert_eq!(candidate_names(&same, None), vec!["Legacy"]);
    }

    #[test]
    fn test_composite_key() {
        let record = CharacterRecord::new("The Beacon").with_real_name("Mara Quill");
        assert_eq!(composite_key(&record, None), "beacon|maraquill");
        assert_eq!(composite_key(&record, Some("Lamp")), "beacon|maraquill|lamp");
    }

    #[test]
    fn test_composite_key_empty_names() {
        let record = CharacterRecord::new("   ");
        assert!(candidate_names(&record, None).is_empty());
        assert_eq!(composite_key(&record, None), "");
    }
}
