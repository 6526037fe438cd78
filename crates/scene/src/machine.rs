//! World/country drill-down state machine.
//!
//! [`MapView`] owns the projection, the zoom controller and the render
//! surface. Pointer and button handlers return [`Effect`]s for the shell to
//! apply; the view state only changes when a zoom animation lands, which
//! [`MapView::tick`] observes through the animation's ticket.

use std::rc::Rc;

use formats::{CountryCodeIndex, FeatureCollection};
use foundation::math::Vec2;
use foundation::time::Time;
use layers::{GeoProjector, Highlight, LabelSource, LabelStyle, LabelsConfig, place_labels};
use runtime::{EventBus, EventKind, Frame, TransformSink, ZoomController, ZoomTicket};
use streaming::DataUnavailable;

use crate::config::MapConfig;
use crate::error::MapError;
use crate::surface::{FeatureKey, FeatureKind, ScreenText, Surface};
use crate::visited::VisitedRegistry;

/// Display-name property of world countries.
pub const COUNTRY_NAME_PROPERTY: &str = "name";
/// Display-name property of country regions.
pub const REGION_NAME_PROPERTY: &str = "NAME_1";

/// Identifies one boundary request. Responses carrying any other ticket
/// than the current one are stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub code: String,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct BoundaryResponse {
    pub ticket: LoadTicket,
    pub result: Result<Rc<FeatureCollection>, DataUnavailable>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RegionsState {
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    World,
    EnteringCountry {
        code: String,
        name: String,
        ticket: ZoomTicket,
    },
    Country {
        code: String,
        name: String,
        regions: RegionsState,
        load: LoadTicket,
    },
    ReturningToWorld {
        code: String,
        name: String,
        ticket: ZoomTicket,
    },
}

/// The drill-down level currently shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    World,
    Country { code: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Rebuild the DOM from the surface (features, labels, status, tooltip,
    /// back button).
    Redraw,
    /// Update one feature's fill.
    Restyle(FeatureKey),
    /// Show, move or hide the tooltip.
    Tooltip,
    Navigate(String),
    Notice(String),
    FetchBoundary(LoadTicket),
}

pub struct MapView {
    config: MapConfig,
    viewport: [f64; 2],
    index: CountryCodeIndex,
    registry: VisitedRegistry,
    world: Option<Rc<FeatureCollection>>,
    projector: GeoProjector,
    zoom: ZoomController,
    surface: Surface,
    labels: LabelsConfig,
    phase: Phase,
    events: EventBus,
}

impl MapView {
    pub fn new(
        config: MapConfig,
        viewport: [f64; 2],
        index: CountryCodeIndex,
        registry: VisitedRegistry,
    ) -> Self {
        let zoom = ZoomController::new(viewport, config.world_extent(), config.durations());
        Self {
            viewport,
            index,
            registry,
            world: None,
            projector: GeoProjector::new(viewport),
            zoom,
            surface: Surface::new(),
            labels: LabelsConfig::default(),
            phase: Phase::World,
            events: EventBus::new(),
            config,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn viewport(&self) -> [f64; 2] {
        self.viewport
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn view_state(&self) -> ViewState {
        match &self.phase {
            Phase::World | Phase::EnteringCountry { .. } => ViewState::World,
            Phase::Country { code, name, .. } | Phase::ReturningToWorld { code, name, .. } => {
                ViewState::Country {
                    code: code.clone(),
                    name: name.clone(),
                }
            }
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn projector(&self) -> &GeoProjector {
        &self.projector
    }

    pub fn zoom(&self) -> &ZoomController {
        &self.zoom
    }

    pub fn registry(&self) -> &VisitedRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn label_style(&self) -> &LabelStyle {
        &self.labels.style
    }

    pub fn is_animating(&self) -> bool {
        self.zoom.is_animating()
    }

    fn in_transition(&self) -> bool {
        matches!(
            self.phase,
            Phase::EnteringCountry { .. } | Phase::ReturningToWorld { .. }
        )
    }

    fn viewport_center(&self) -> Vec2 {
        Vec2::new(self.viewport[0] / 2.0, self.viewport[1] / 2.0)
    }

    /// Installs the world dataset and renders the world view.
    pub fn show_world(&mut self, world: Rc<FeatureCollection>) -> Vec<Effect> {
        self.world = Some(world);
        self.render_world();
        vec![Effect::Redraw]
    }

    pub fn world_unavailable(&mut self, err: &DataUnavailable) -> Vec<Effect> {
        tracing::warn!(error = %err, "world map unavailable");
        self.events.emit(EventKind::Load, err.to_string());
        self.surface.clear();
        self.surface.set_status(Some(ScreenText {
            text: "Failed to load world map".to_string(),
            position: self.viewport_center(),
        }));
        vec![Effect::Redraw]
    }

    fn render_world(&mut self) {
        self.surface.clear();
        self.surface.set_back_visible(false);
        self.surface.set_stroke(self.config.palette.world_stroke());
        let Some(world) = self.world.clone() else {
            return;
        };
        for feature in &world.features {
            let projected = self.projector.project(feature);
            if projected.path.is_empty() {
                continue;
            }
            let name = feature
                .property_str(COUNTRY_NAME_PROPERTY)
                .unwrap_or_default();
            let code = feature
                .id
                .as_deref()
                .and_then(|id| self.index.code_for(id))
                .map(str::to_string);
            let visited = code
                .as_deref()
                .is_some_and(|c| self.registry.is_country_visited(c));
            let fill = self.config.palette.fill(visited, Highlight::None).to_string();
            self.surface.push_feature(
                FeatureKind::Country {
                    id: feature.id.clone(),
                    code,
                },
                name,
                projected,
                visited,
                fill,
            );
        }
    }

    fn render_regions(&mut self, code: &str, regions: &FeatureCollection) {
        self.surface.clear();
        self.surface.set_back_visible(true);
        self.surface.set_stroke(self.config.palette.region_stroke());

        let mut label_sources: Vec<(String, Option<Vec2>, f64)> = Vec::new();
        for feature in &regions.features {
            let projected = self.projector.project(feature);
            if projected.path.is_empty() {
                continue;
            }
            let name = feature
                .property_str(REGION_NAME_PROPERTY)
                .or_else(|| feature.property_str(COUNTRY_NAME_PROPERTY))
                .unwrap_or_default();
            let visited = self.registry.is_region_visited(code, &name);
            let fill = self.config.palette.fill(visited, Highlight::None).to_string();
            label_sources.push((name.clone(), projected.centroid, projected.area));
            self.surface.push_feature(
                FeatureKind::Region {
                    code: code.to_string(),
                },
                name,
                projected,
                visited,
                fill,
            );
        }

        let labels = place_labels(
            &self.labels,
            label_sources.iter().map(|(text, centroid, area)| LabelSource {
                text,
                centroid: *centroid,
                area: *area,
            }),
        );
        self.surface.set_labels(labels);
    }

    /// Click on a rendered feature.
    pub fn click(&mut self, key: FeatureKey, now: Time) -> Vec<Effect> {
        let Some(feature) = self.surface.feature(key) else {
            tracing::debug!(%key, "click on a replaced layer ignored");
            return Vec::new();
        };
        let kind = feature.kind.clone();
        let name = feature.name.clone();
        let bounds = feature.bounds;
        let visited = feature.visited;

        match kind {
            FeatureKind::Country { id, code } => {
                if !matches!(
                    self.phase,
                    Phase::World | Phase::EnteringCountry { .. }
                ) {
                    return Vec::new();
                }
                let Some(code) = code else {
                    let err = MapError::UnresolvedIdentifier { id, name };
                    tracing::debug!("{err}");
                    self.events.emit(EventKind::Unresolved, err.to_string());
                    return Vec::new();
                };
                let Some(bounds) = bounds else {
                    return Vec::new();
                };
                let ticket = self
                    .zoom
                    .zoom_to_bounds(&bounds, self.config.fit_margin, now);
                tracing::debug!(%code, ticket = ticket.id(), "zooming to country");
                self.events.emit(EventKind::Drill, format!("entering {code}"));
                self.phase = Phase::EnteringCountry { code, name, ticket };
                Vec::new()
            }
            FeatureKind::Region { code } => {
                if !matches!(self.phase, Phase::Country { .. }) {
                    return Vec::new();
                }
                if visited {
                    let url = self.config.note_url(&code, &name);
                    self.events.emit(EventKind::Navigate, url.clone());
                    vec![Effect::Navigate(url)]
                } else {
                    let notice = MapError::NotVisited { code, region: name }.to_string();
                    self.events.emit(EventKind::Notice, notice.clone());
                    vec![Effect::Notice(notice)]
                }
            }
        }
    }

    /// Pointer entered a feature.
    pub fn hover(&mut self, key: FeatureKey, pointer: Vec2) -> Vec<Effect> {
        let palette = &self.config.palette;
        let Some(feature) = self.surface.feature_mut(key) else {
            return Vec::new();
        };
        feature.hovered = true;
        feature.fill = palette.fill(feature.visited, Highlight::Hover).to_string();
        let text = if feature.visited {
            format!("{} (visited)", feature.name)
        } else {
            feature.name.clone()
        };
        self.surface.set_tooltip(Some(ScreenText {
            text,
            position: pointer,
        }));
        vec![Effect::Restyle(key), Effect::Tooltip]
    }

    /// Pointer moved within a hovered feature; the tooltip follows.
    pub fn pointer_move(&mut self, key: FeatureKey, pointer: Vec2) -> Vec<Effect> {
        if !self.surface.feature(key).is_some_and(|f| f.hovered) {
            return Vec::new();
        }
        let Some(mut tooltip) = self.surface.tooltip().cloned() else {
            return Vec::new();
        };
        tooltip.position = pointer;
        self.surface.set_tooltip(Some(tooltip));
        vec![Effect::Tooltip]
    }

    /// Pointer left a feature: restore the base fill from the registry.
    pub fn leave(&mut self, key: FeatureKey) -> Vec<Effect> {
        let palette = &self.config.palette;
        let registry = &self.registry;
        let Some(feature) = self.surface.feature_mut(key) else {
            return Vec::new();
        };
        let visited = match &feature.kind {
            FeatureKind::Country { code, .. } => code
                .as_deref()
                .is_some_and(|c| registry.is_country_visited(c)),
            FeatureKind::Region { code } => registry.is_region_visited(code, &feature.name),
        };
        feature.visited = visited;
        feature.hovered = false;
        feature.fill = palette.fill(visited, Highlight::None).to_string();
        self.surface.set_tooltip(None);
        vec![Effect::Restyle(key), Effect::Tooltip]
    }

    pub fn back(&mut self, now: Time) -> Vec<Effect> {
        let (code, name) = match &self.phase {
            Phase::Country { code, name, .. } => (code.clone(), name.clone()),
            _ => return Vec::new(),
        };
        self.surface.clear();
        self.surface.set_back_visible(false);
        let ticket = self.zoom.reset(now);
        self.events.emit(EventKind::Drill, format!("leaving {code}"));
        self.phase = Phase::ReturningToWorld { code, name, ticket };
        vec![Effect::Redraw]
    }

    /// Zoom-in button. Ignored while drilling in or out.
    pub fn zoom_in(&mut self, now: Time) -> bool {
        self.zoom_step(self.config.zoom_in_factor, now)
    }

    /// Zoom-out button. Ignored while drilling in or out.
    pub fn zoom_out(&mut self, now: Time) -> bool {
        self.zoom_step(self.config.zoom_out_factor, now)
    }

    fn zoom_step(&mut self, factor: f64, now: Time) -> bool {
        if self.in_transition() {
            return false;
        }
        self.zoom.zoom_by(factor, now);
        self.events.emit(EventKind::Zoom, format!("zoom by {factor}"));
        true
    }

    /// Wheel zoom about `pointer`.
    pub fn wheel(&mut self, pointer: Vec2, delta_y: f64, sink: &mut impl TransformSink) -> bool {
        if self.in_transition() {
            return false;
        }
        let factor = 2f64.powf(-delta_y * self.config.wheel_sensitivity);
        self.zoom.zoom_at(pointer, factor, sink);
        true
    }

    /// Drag pan in screen pixels.
    pub fn pan(&mut self, dx: f64, dy: f64, sink: &mut impl TransformSink) -> bool {
        if self.in_transition() {
            return false;
        }
        self.zoom.pan_by(dx, dy, sink);
        true
    }

    /// Advances the zoom animation and lands phase transitions.
    pub fn tick(&mut self, frame: Frame, sink: &mut impl TransformSink) -> Vec<Effect> {
        let Some(done) = self.zoom.tick(frame.time, sink) else {
            return Vec::new();
        };
        let entering =
            matches!(&self.phase, Phase::EnteringCountry { ticket, .. } if *ticket == done);
        let returning =
            matches!(&self.phase, Phase::ReturningToWorld { ticket, .. } if *ticket == done);
        if entering {
            self.enter_country()
        } else if returning {
            self.return_to_world()
        } else {
            Vec::new()
        }
    }

    fn enter_country(&mut self) -> Vec<Effect> {
        let Phase::EnteringCountry { code, name, .. } =
            std::mem::replace(&mut self.phase, Phase::World)
        else {
            return Vec::new();
        };
        self.surface.clear();
        self.surface.set_back_visible(true);
        self.surface.set_status(Some(ScreenText {
            text: format!("Loading {name}..."),
            position: self.viewport_center(),
        }));
        self.zoom.set_extent(self.config.country_extent());
        let load = LoadTicket {
            code: code.clone(),
            generation: self.surface.generation(),
        };
        tracing::info!(%code, "entered country view");
        self.phase = Phase::Country {
            code,
            name,
            regions: RegionsState::Loading,
            load: load.clone(),
        };
        vec![Effect::Redraw, Effect::FetchBoundary(load)]
    }

    fn return_to_world(&mut self) -> Vec<Effect> {
        self.projector.reset();
        self.zoom.set_extent(self.config.world_extent());
        self.render_world();
        self.phase = Phase::World;
        tracing::info!("returned to world view");
        vec![Effect::Redraw]
    }

    /// Applies a boundary response if it belongs to the current country
    /// view; stale responses are dropped without touching the surface.
    pub fn boundaries_loaded(&mut self, response: BoundaryResponse) -> Vec<Effect> {
        let (code, name) = match &self.phase {
            Phase::Country {
                code,
                name,
                regions: RegionsState::Loading,
                load,
            } if *load == response.ticket => (code.clone(), name.clone()),
            _ => {
                tracing::debug!(
                    code = %response.ticket.code,
                    generation = response.ticket.generation,
                    "discarding stale boundary response"
                );
                self.events.emit(
                    EventKind::Discarded,
                    format!("stale boundaries for {}", response.ticket.code),
                );
                return Vec::new();
            }
        };

        let state = match response.result {
            Ok(regions) => {
                self.render_regions(&code, &regions);
                self.events.emit(EventKind::Load, format!("{code} boundaries"));
                RegionsState::Ready
            }
            Err(err) => {
                tracing::warn!(error = %err, "country boundaries unavailable");
                self.events.emit(EventKind::Load, err.to_string());
                self.surface.set_status(Some(ScreenText {
                    text: format!("Failed to load {name} boundaries"),
                    position: self.viewport_center(),
                }));
                RegionsState::Failed
            }
        };
        if let Phase::Country { regions, .. } = &mut self.phase {
            *regions = state;
        }
        vec![Effect::Redraw]
    }
}
