//! Visited countries and regions.

use std::collections::{BTreeMap, BTreeSet};

use streaming::{DataLoader, Fetch};

/// Visits recorded under one country code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryVisits {
    /// The bare code appeared in the visited set.
    pub whole_country: bool,
    /// Region parts of `CODE_region` keys, as written.
    pub regions: BTreeSet<String>,
}

/// Index over the visited set, grouped by country code once at load.
///
/// Keys without `_` are whole-country visits; keys with `_` split at the
/// first `_` into code and region. A country counts as visited if it has
/// either kind of entry. Codes therefore never contain `_`: a key such as
/// `"FRA_paris"` is only a region of `FRA`, never a country code of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitedRegistry {
    countries: BTreeMap<String, CountryVisits>,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut countries: BTreeMap<String, CountryVisits> = BTreeMap::new();
        for key in keys {
            let key = key.as_ref();
            match key.split_once('_') {
                Some((code, region)) => {
                    countries
                        .entry(code.to_string())
                        .or_default()
                        .regions
                        .insert(region.to_string());
                }
                None => countries.entry(key.to_string()).or_default().whole_country = true,
            }
        }
        Self { countries }
    }

    /// Loads the visited set. Unavailable data leaves the registry empty.
    pub async fn load<F: Fetch>(loader: &DataLoader<F>) -> Self {
        match loader.visited_keys().await {
            Ok(keys) => Self::from_keys(keys),
            Err(e) => {
                tracing::warn!(error = %e, "visited set unavailable; nothing is marked visited");
                Self::new()
            }
        }
    }

    pub fn is_country_visited(&self, code: &str) -> bool {
        self.countries.contains_key(code)
    }

    /// `region_name` is lowercased before lookup.
    pub fn is_region_visited(&self, code: &str, region_name: &str) -> bool {
        self.countries
            .get(code)
            .is_some_and(|v| v.regions.contains(&region_name.to_lowercase()))
    }

    pub fn country(&self, code: &str) -> Option<&CountryVisits> {
        self.countries.get(code)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}
