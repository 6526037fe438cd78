use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Maps numeric topology ids (as text) to ISO 3166-1 alpha-3 codes.
///
/// The ids in `id-to-country-code.json` are zero-padded (`"004"`), while some
/// topologies carry bare numbers (`4`). Lookups accept either spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCodeIndex {
    codes: BTreeMap<String, String>,
}

impl CountryCodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(payload: &str) -> Result<Self, FormatError> {
        let index: CountryCodeIndex = serde_json::from_str(payload)?;
        if let Some((id, _)) = index.codes.iter().find(|(_, code)| code.trim().is_empty()) {
            return Err(FormatError::InvalidIndex(format!("empty code for id {id:?}")));
        }
        Ok(index)
    }

    pub fn insert(&mut self, id: impl Into<String>, code: impl Into<String>) {
        self.codes.insert(id.into(), code.into());
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn code_for(&self, id: &str) -> Option<&str> {
        if let Some(code) = self.codes.get(id) {
            return Some(code.as_str());
        }
        let n: u32 = id.trim().parse().ok()?;
        [format!("{n:03}"), n.to_string()]
            .iter()
            .find_map(|k| self.codes.get(k))
            .map(|c| c.as_str())
    }
}

/// Parses `visited_regions.json`: a flat array of `"CODE"` / `"CODE_region"` keys.
pub fn parse_visited_keys(payload: &str) -> Result<Vec<String>, FormatError> {
    let keys: Vec<String> = serde_json::from_str(payload)?;
    Ok(keys
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{CountryCodeIndex, parse_visited_keys};
    use crate::error::FormatError;

    #[test]
    fn resolves_padded_and_bare_ids() {
        let index =
            CountryCodeIndex::from_json_str(r#"{"004": "AFG", "250": "FRA", "840": "USA"}"#)
                .expect("index");
        assert_eq!(index.len(), 3);
        assert_eq!(index.code_for("250"), Some("FRA"));
        assert_eq!(index.code_for("004"), Some("AFG"));
        assert_eq!(index.code_for("4"), Some("AFG"));
        assert_eq!(index.code_for("999"), None);
        assert_eq!(index.code_for("-99"), None);
    }

    #[test]
    fn bare_keys_resolve_padded_ids() {
        let mut index = CountryCodeIndex::new();
        index.insert("4", "AFG");
        assert_eq!(index.code_for("004"), Some("AFG"));
    }

    #[test]
    fn rejects_blank_codes() {
        let err = CountryCodeIndex::from_json_str(r#"{"004": " "}"#).unwrap_err();
        assert!(matches!(err, FormatError::InvalidIndex(_)));
    }

    #[test]
    fn visited_keys_are_trimmed() {
        let keys = parse_visited_keys(r#"["USA", " FRA_paris ", ""]"#).expect("keys");
        assert_eq!(keys, vec!["USA".to_string(), "FRA_paris".to_string()]);

        assert!(parse_visited_keys(r#"{"USA": true}"#).is_err());
    }
}
