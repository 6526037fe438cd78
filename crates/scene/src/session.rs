//! Async orchestration around [`MapView`].
//!
//! The index and visited set are loaded before the first world render, and
//! both fail open. Boundary fetches run independently and report back with
//! their [`LoadTicket`].

use formats::CountryCodeIndex;
use streaming::{DataLoader, DataPaths, Fetch};

use crate::config::MapConfig;
use crate::machine::{BoundaryResponse, Effect, LoadTicket, MapView};
use crate::visited::VisitedRegistry;

pub fn loader_for<F: Fetch>(config: &MapConfig, fetch: F) -> DataLoader<F> {
    DataLoader::new(
        fetch,
        DataPaths::new(config.data_base.as_str()),
        config.boundary_cache_entries,
    )
}

/// Loads the code index, visited set and world topology, then renders the
/// world view.
pub async fn boot<F: Fetch>(
    config: MapConfig,
    viewport: [f64; 2],
    loader: &DataLoader<F>,
) -> (MapView, Vec<Effect>) {
    let index = match loader.country_codes().await {
        Ok(index) => index,
        Err(e) => {
            tracing::warn!(error = %e, "country code index unavailable; countries are not clickable");
            CountryCodeIndex::new()
        }
    };
    let registry = VisitedRegistry::load(loader).await;
    let mut view = MapView::new(config, viewport, index, registry);
    let effects = match loader.world_countries().await {
        Ok(world) => view.show_world(world),
        Err(e) => view.world_unavailable(&e),
    };
    (view, effects)
}

pub async fn fetch_boundaries<F: Fetch>(
    loader: &DataLoader<F>,
    ticket: LoadTicket,
) -> BoundaryResponse {
    let result = loader.country_boundaries(&ticket.code).await;
    BoundaryResponse { ticket, result }
}

#[cfg(test)]
mod tests {
    use super::{boot, fetch_boundaries, loader_for};
    use crate::config::MapConfig;
    use crate::machine::{Effect, Phase, RegionsState};
    use foundation::time::Time;
    use pollster::block_on;
    use runtime::{Frame, ZoomTransform};
    use streaming::MemoryFetch;

    const WORLD: &str = r#"{
        "type": "Topology",
        "transform": { "scale": [0.01, 0.01], "translate": [-180, -90] },
        "arcs": [
            [[18000, 13400], [600, 0], [0, 600], [-600, 0], [0, -600]],
            [[7000, 12000], [2000, 0], [0, 1000], [-2000, 0], [0, -1000]]
        ],
        "objects": { "countries": { "type": "GeometryCollection", "geometries": [
            { "type": "Polygon", "id": "250", "properties": { "name": "France" }, "arcs": [[0]] },
            { "type": "Polygon", "id": 840, "properties": { "name": "United States" }, "arcs": [[1]] }
        ] } }
    }"#;

    const FRANCE: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"NAME_1":"Paris"},
         "geometry":{"type":"Polygon","coordinates":[[[2,48],[3,48],[3,49],[2,49],[2,48]]]}},
        {"type":"Feature","properties":{"NAME_1":"Corse"},
         "geometry":{"type":"Polygon","coordinates":[[[8.5,41.4],[9.5,41.4],[9.4,43],[8.5,41.4]]]}}
    ]}"#;

    fn site() -> MemoryFetch {
        MemoryFetch::new()
            .with_file("../data/world-map.json", WORLD)
            .with_file("../data/id-to-country-code.json", r#"{"250":"FRA","840":"USA"}"#)
            .with_file("../data/visited_regions.json", r#"["USA","FRA_paris"]"#)
            .with_file("../data/countries/FRA.json", FRANCE)
    }

    fn settle(view: &mut crate::machine::MapView, start: Time) -> Vec<Effect> {
        let mut frame = Frame::new(0, start);
        let mut sink: Vec<ZoomTransform> = Vec::new();
        let mut effects = Vec::new();
        while view.is_animating() {
            frame = frame.advance(1.0 / 60.0);
            effects.extend(view.tick(frame, &mut sink));
        }
        effects
    }

    #[test]
    fn boots_and_drills_into_a_country() {
        let config = MapConfig::default();
        let loader = loader_for(&config, site());
        let (mut view, effects) = block_on(boot(config, [960.0, 500.0], &loader));
        assert_eq!(effects, vec![Effect::Redraw]);
        assert_eq!(view.surface().features().len(), 2);
        assert!(view.surface().features().iter().all(|f| f.visited));

        let fra = view.surface().features()[0].key;
        view.click(fra, Time(0.0));
        let effects = settle(&mut view, Time(0.0));
        let Some(Effect::FetchBoundary(ticket)) = effects.last().cloned() else {
            panic!("expected a boundary fetch, got {effects:?}");
        };

        let response = block_on(fetch_boundaries(&loader, ticket));
        assert_eq!(view.boundaries_loaded(response), vec![Effect::Redraw]);
        assert!(matches!(
            view.phase(),
            Phase::Country {
                regions: RegionsState::Ready,
                ..
            }
        ));
        assert_eq!(view.surface().features().len(), 2);
        assert_eq!(loader.fetcher().request_count("../data/countries/FRA.json"), 1);
    }

    #[test]
    fn missing_index_and_visited_set_fail_open() {
        let fetch = MemoryFetch::new().with_file("../data/world-map.json", WORLD);
        let config = MapConfig::default();
        let loader = loader_for(&config, fetch);
        let (mut view, _) = block_on(boot(config, [960.0, 500.0], &loader));
        assert_eq!(view.surface().features().len(), 2);
        assert!(view.surface().features().iter().all(|f| !f.visited));

        let fra = view.surface().features()[0].key;
        assert_eq!(view.click(fra, Time(0.0)), vec![]);
        assert!(!view.is_animating());
        assert_eq!(view.phase(), &Phase::World);
    }

    #[test]
    fn missing_world_shows_failure_text() {
        let config = MapConfig::default();
        let loader = loader_for(&config, MemoryFetch::new());
        let (view, effects) = block_on(boot(config, [960.0, 500.0], &loader));
        assert_eq!(effects, vec![Effect::Redraw]);
        assert!(view.surface().features().is_empty());
        assert_eq!(
            view.surface().status().map(|s| s.text.as_str()),
            Some("Failed to load world map")
        );
    }

    #[test]
    fn failed_boundaries_are_retried_on_next_visit() {
        let mut fetch = site();
        fetch.remove("../data/countries/FRA.json");
        let config = MapConfig::default();
        let loader = loader_for(&config, fetch);
        let (mut view, _) = block_on(boot(config, [960.0, 500.0], &loader));

        let fra = view.surface().features()[0].key;
        view.click(fra, Time(0.0));
        let Some(Effect::FetchBoundary(ticket)) = settle(&mut view, Time(0.0)).pop() else {
            panic!("expected a boundary fetch");
        };
        view.boundaries_loaded(block_on(fetch_boundaries(&loader, ticket)));
        assert!(matches!(
            view.phase(),
            Phase::Country {
                regions: RegionsState::Failed,
                ..
            }
        ));

        view.back(Time(1.0));
        settle(&mut view, Time(1.0));
        let fra = view.surface().features()[0].key;
        view.click(fra, Time(2.0));
        let Some(Effect::FetchBoundary(ticket)) = settle(&mut view, Time(2.0)).pop() else {
            panic!("expected a boundary fetch");
        };
        block_on(fetch_boundaries(&loader, ticket));
        assert_eq!(loader.fetcher().request_count("../data/countries/FRA.json"), 2);
    }
}
