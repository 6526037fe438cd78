//! Fetches and decodes the map's data files.

use std::cell::RefCell;
use std::rc::Rc;

use formats::{CountryCodeIndex, FeatureCollection, FormatError, Topology, parse_visited_keys};

use crate::cache::BoundaryCache;
use crate::io::{Fetch, FetchError};

/// Name of the topology object holding country shapes.
pub const COUNTRIES_OBJECT: &str = "countries";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    WorldTopology,
    CountryCodes,
    VisitedSet,
    CountryBoundaries(String),
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::WorldTopology => write!(f, "world topology"),
            Resource::CountryCodes => write!(f, "country code index"),
            Resource::VisitedSet => write!(f, "visited set"),
            Resource::CountryBoundaries(code) => write!(f, "{code} boundaries"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUnavailable {
    pub resource: Resource,
    pub reason: String,
}

impl DataUnavailable {
    fn fetch(resource: Resource, err: FetchError) -> Self {
        Self {
            resource,
            reason: err.to_string(),
        }
    }

    fn decode(resource: Resource, err: FormatError) -> Self {
        Self {
            resource,
            reason: err.to_string(),
        }
    }
}

impl std::fmt::Display for DataUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} unavailable: {}", self.resource, self.reason)
    }
}

impl std::error::Error for DataUnavailable {}

/// URL layout under the configured data base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    base: String,
}

impl DataPaths {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, resource: &Resource) -> String {
        match resource {
            Resource::WorldTopology => format!("{}/world-map.json", self.base),
            Resource::CountryCodes => format!("{}/id-to-country-code.json", self.base),
            Resource::VisitedSet => format!("{}/visited_regions.json", self.base),
            Resource::CountryBoundaries(code) => format!("{}/countries/{code}.json", self.base),
        }
    }
}

/// Loads the world topology, code index, visited set and per-country
/// boundaries.
///
/// The world dataset is kept for the session and boundaries are cached per
/// code. Failed fetches are never cached, so a later request retries.
/// Methods take `&self`; internal state is borrowed only between awaits.
pub struct DataLoader<F> {
    fetch: F,
    paths: DataPaths,
    world: RefCell<Option<Rc<FeatureCollection>>>,
    boundaries: RefCell<BoundaryCache<FeatureCollection>>,
}

impl<F: Fetch> DataLoader<F> {
    pub fn new(fetch: F, paths: DataPaths, cache_entries: usize) -> Self {
        Self {
            fetch,
            paths,
            world: RefCell::new(None),
            boundaries: RefCell::new(BoundaryCache::new(cache_entries)),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetch
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    async fn text(&self, resource: &Resource) -> Result<String, DataUnavailable> {
        let url = self.paths.url(resource);
        tracing::debug!(%url, "fetching {resource}");
        self.fetch
            .fetch_text(&url)
            .await
            .map_err(|e| DataUnavailable::fetch(resource.clone(), e))
    }

    /// Country shapes from the world topology.
    pub async fn world_countries(&self) -> Result<Rc<FeatureCollection>, DataUnavailable> {
        if let Some(world) = self.world.borrow().as_ref() {
            return Ok(Rc::clone(world));
        }
        let resource = Resource::WorldTopology;
        let payload = self.text(&resource).await?;
        let countries = Topology::from_json_str(&payload)
            .and_then(|topo| topo.feature_collection(COUNTRIES_OBJECT))
            .map_err(|e| DataUnavailable::decode(resource, e))?;
        tracing::info!(features = countries.len(), "loaded world topology");
        let countries = Rc::new(countries);
        *self.world.borrow_mut() = Some(Rc::clone(&countries));
        Ok(countries)
    }

    pub async fn country_codes(&self) -> Result<CountryCodeIndex, DataUnavailable> {
        let resource = Resource::CountryCodes;
        let payload = self.text(&resource).await?;
        let index = CountryCodeIndex::from_json_str(&payload)
            .map_err(|e| DataUnavailable::decode(resource, e))?;
        tracing::info!(entries = index.len(), "loaded country code index");
        Ok(index)
    }

    pub async fn visited_keys(&self) -> Result<Vec<String>, DataUnavailable> {
        let resource = Resource::VisitedSet;
        let payload = self.text(&resource).await?;
        let keys =
            parse_visited_keys(&payload).map_err(|e| DataUnavailable::decode(resource, e))?;
        tracing::info!(keys = keys.len(), "loaded visited set");
        Ok(keys)
    }

    /// Sub-national boundaries for `code`.
    pub async fn country_boundaries(
        &self,
        code: &str,
    ) -> Result<Rc<FeatureCollection>, DataUnavailable> {
        if let Some(hit) = self.boundaries.borrow_mut().get(code) {
            return Ok(hit);
        }
        let resource = Resource::CountryBoundaries(code.to_string());
        let payload = self.text(&resource).await?;
        let regions = FeatureCollection::from_geojson_str(&payload)
            .map_err(|e| DataUnavailable::decode(resource, e))?;
        tracing::info!(code, features = regions.len(), "loaded country boundaries");
        let regions = Rc::new(regions);
        self.boundaries
            .borrow_mut()
            .insert(code, Rc::clone(&regions));
        Ok(regions)
    }

    pub fn cached_boundaries(&self) -> usize {
        self.boundaries.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::{DataLoader, DataPaths, Resource};
    use crate::io::MemoryFetch;
    use pollster::block_on;
    use std::rc::Rc;

    const WORLD: &str = r#"{
        "type": "Topology",
        "arcs": [[[0, 0], [10, 0], [10, 10], [0, 0]]],
        "objects": { "countries": { "type": "GeometryCollection", "geometries": [
            { "type": "Polygon", "id": "250", "properties": { "name": "France" }, "arcs": [[0]] }
        ] } }
    }"#;

    const FRANCE: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"NAME_1":"Paris"},
         "geometry":{"type":"Polygon","coordinates":[[[2,48],[3,48],[3,49],[2,48]]]}}
    ]}"#;

    fn loader(fetch: MemoryFetch) -> DataLoader<MemoryFetch> {
        DataLoader::new(fetch, DataPaths::new("../data/"), 8)
    }

    #[test]
    fn builds_resource_urls() {
        let paths = DataPaths::new("../data/");
        assert_eq!(paths.url(&Resource::WorldTopology), "../data/world-map.json");
        assert_eq!(
            paths.url(&Resource::CountryCodes),
            "../data/id-to-country-code.json"
        );
        assert_eq!(paths.url(&Resource::VisitedSet), "../data/visited_regions.json");
        assert_eq!(
            paths.url(&Resource::CountryBoundaries("FRA".into())),
            "../data/countries/FRA.json"
        );
    }

    #[test]
    fn world_topology_is_fetched_once() {
        let l = loader(MemoryFetch::new().with_file("../data/world-map.json", WORLD));
        let a = block_on(l.world_countries()).expect("world");
        let b = block_on(l.world_countries()).expect("world");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.features[0].property_str("name").as_deref(), Some("France"));
        assert_eq!(l.fetcher().request_count("../data/world-map.json"), 1);
    }

    #[test]
    fn boundaries_are_cached_per_code() {
        let l = loader(MemoryFetch::new().with_file("../data/countries/FRA.json", FRANCE));
        let a = block_on(l.country_boundaries("FRA")).expect("FRA");
        let b = block_on(l.country_boundaries("FRA")).expect("FRA");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(l.cached_boundaries(), 1);
        assert_eq!(l.fetcher().request_count("../data/countries/FRA.json"), 1);
    }

    #[test]
    fn failures_are_not_cached() {
        let l = loader(MemoryFetch::new());
        let err = block_on(l.country_boundaries("ITA")).unwrap_err();
        assert_eq!(err.resource, Resource::CountryBoundaries("ITA".into()));
        assert_eq!(
            err.to_string(),
            "ITA boundaries unavailable: HTTP 404 for ../data/countries/ITA.json"
        );
        assert!(block_on(l.country_boundaries("ITA")).is_err());
        assert_eq!(l.cached_boundaries(), 0);
        assert_eq!(l.fetcher().request_count("../data/countries/ITA.json"), 2);
    }

    #[test]
    fn decode_failures_name_the_resource() {
        let l = loader(
            MemoryFetch::new()
                .with_file("../data/visited_regions.json", "{}")
                .with_file("../data/id-to-country-code.json", r#"{"250":"FRA"}"#),
        );
        let err = block_on(l.visited_keys()).unwrap_err();
        assert_eq!(err.resource, Resource::VisitedSet);
        let index = block_on(l.country_codes()).expect("index");
        assert_eq!(index.code_for("250"), Some("FRA"));
    }
}
