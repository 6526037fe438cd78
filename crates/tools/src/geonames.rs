//! Readers for GeoNames tab-separated dumps.
//!
//! `countryInfo.txt` columns: ISO2, ISO3, ISO numeric, ...
//! `cities15000.txt` columns: geonameid, name, asciiname, alternatenames,
//! latitude, longitude, feature class, feature code, country code, ...,
//! population (column 14).

use std::collections::BTreeMap;
use std::fmt;

use formats::CountryCodeIndex;
use serde::{Deserialize, Serialize};

const ISO3_COLUMN: usize = 1;
const ISO_NUMERIC_COLUMN: usize = 2;

const CITY_NAME_COLUMN: usize = 1;
const CITY_LAT_COLUMN: usize = 4;
const CITY_LON_COLUMN: usize = 5;
const CITY_COUNTRY_COLUMN: usize = 8;
const CITY_POPULATION_COLUMN: usize = 14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// One-based line number.
    pub line: usize,
    pub reason: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

impl std::error::Error for ParseError {}

fn records(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with('#'))
        .map(|(n, line)| (n, line.split('\t').collect()))
}

fn column<'a>(fields: &[&'a str], index: usize, line: usize) -> Result<&'a str, ParseError> {
    fields.get(index).copied().ok_or_else(|| ParseError {
        line,
        reason: format!("expected at least {} columns, found {}", index + 1, fields.len()),
    })
}

/// Builds the numeric-id to ISO3 index from `countryInfo.txt`.
///
/// Comment lines (`#`) are skipped, as are entries without an ISO3 code or
/// numeric id.
pub fn parse_country_info(text: &str) -> Result<CountryCodeIndex, ParseError> {
    let mut index = CountryCodeIndex::new();
    for (line, fields) in records(text) {
        let iso3 = column(&fields, ISO3_COLUMN, line)?.trim();
        let numeric = column(&fields, ISO_NUMERIC_COLUMN, line)?.trim();
        if iso3.is_empty() || numeric.is_empty() {
            continue;
        }
        index.insert(numeric, iso3);
    }
    Ok(index)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub population: u64,
}

fn parse_number<T: std::str::FromStr>(raw: &str, what: &str, line: usize) -> Result<T, ParseError> {
    raw.trim().parse().map_err(|_| ParseError {
        line,
        reason: format!("invalid {what} {raw:?}"),
    })
}

/// Groups `cities15000.txt` rows by lowercase country code, in file order.
pub fn parse_cities(text: &str) -> Result<BTreeMap<String, Vec<City>>, ParseError> {
    let mut by_country: BTreeMap<String, Vec<City>> = BTreeMap::new();
    for (line, fields) in records(text) {
        let population = column(&fields, CITY_POPULATION_COLUMN, line)?;
        let city = City {
            name: column(&fields, CITY_NAME_COLUMN, line)?.to_string(),
            lat: parse_number(column(&fields, CITY_LAT_COLUMN, line)?, "latitude", line)?,
            lon: parse_number(column(&fields, CITY_LON_COLUMN, line)?, "longitude", line)?,
            population: if population.trim().is_empty() {
                0
            } else {
                parse_number(population, "population", line)?
            },
        };
        let country = column(&fields, CITY_COUNTRY_COLUMN, line)?.trim().to_lowercase();
        by_country.entry(country).or_default().push(city);
    }
    Ok(by_country)
}

pub fn cities_file_name(country: &str) -> String {
    format!("cities-{}.json", country.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::{City, cities_file_name, parse_cities, parse_country_info};
    use pretty_assertions::assert_eq;

    const COUNTRY_INFO: &str = "\
# GeoNames country info
#ISO\tISO3\tISO-Numeric\tfips\tCountry
AF\tAFG\t004\tAF\tAfghanistan
FR\tFRA\t250\tFR\tFrance
XK\tXKX\t\tKV\tKosovo
";

    fn city_row(name: &str, lat: &str, lon: &str, cc: &str, population: &str) -> String {
        let mut fields = vec![""; 19];
        fields[0] = "1";
        fields[1] = name;
        fields[2] = name;
        fields[4] = lat;
        fields[5] = lon;
        fields[8] = cc;
        fields[14] = population;
        fields.join("\t")
    }

    #[test]
    fn country_info_maps_numeric_ids_to_iso3() {
        let index = parse_country_info(COUNTRY_INFO).expect("index");
        assert_eq!(index.len(), 2);
        assert_eq!(index.code_for("004"), Some("AFG"));
        assert_eq!(index.code_for("4"), Some("AFG"));
        assert_eq!(index.code_for("250"), Some("FRA"));

        let json = serde_json::to_string(&index).expect("json");
        assert_eq!(json, r#"{"004":"AFG","250":"FRA"}"#);
    }

    #[test]
    fn short_country_rows_report_their_line() {
        let err = parse_country_info("# header\nAF\tAFG\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn cities_group_by_lowercase_country() {
        let text = [
            city_row("Paris", "48.85341", "2.3488", "FR", "2138551"),
            city_row("Kabul", "34.52813", "69.17233", "AF", "4434550"),
            city_row("Lyon", "45.74846", "4.84671", "FR", ""),
        ]
        .join("\n");
        let cities = parse_cities(&text).expect("cities");

        assert_eq!(cities.keys().collect::<Vec<_>>(), vec!["af", "fr"]);
        assert_eq!(
            cities["fr"],
            vec![
                City {
                    name: "Paris".to_string(),
                    lat: 48.85341,
                    lon: 2.3488,
                    population: 2_138_551,
                },
                City {
                    name: "Lyon".to_string(),
                    lat: 45.74846,
                    lon: 4.84671,
                    population: 0,
                },
            ]
        );
        assert_eq!(cities_file_name("FR"), "cities-fr.json");
    }

    #[test]
    fn bad_coordinates_are_errors() {
        let text = city_row("Nowhere", "north", "2.0", "FR", "1");
        let err = parse_cities(&text).unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.reason.contains("latitude"), "{err}");
    }
}
