use console_error_panic_hook::set_once;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, MouseEvent, WheelEvent};

use foundation::time::Time;
use runtime::Frame;
use scene::{Effect, FeatureKey, LoadTicket, MapConfig, MapView, boot, fetch_boundaries, loader_for};
use streaming::DataLoader;

mod dom;
mod fetch;
mod gesture;
mod logging;

use dom::{FEATURE_ATTR, MapDom};
use fetch::GlooFetch;
use gesture::{DragTracker, wheel_delta_px};

/// Fallback when the container reports no width.
const FALLBACK_WIDTH: f64 = 960.0;

struct MapApp {
    view: MapView,
    loader: Rc<DataLoader<GlooFetch>>,
    dom: MapDom,
    frame: Frame,
    raf_pending: bool,
    drag: Option<DragTracker>,
    suppress_click: bool,
}

thread_local! {
    static APP: RefCell<Option<MapApp>> = const { RefCell::new(None) };
}

fn with_app<R>(f: impl FnOnce(&mut MapApp) -> R) -> Option<R> {
    APP.with(|cell| cell.borrow_mut().as_mut().map(f))
}

fn now() -> Time {
    let ms = web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0);
    Time::from_millis(ms)
}

fn log_js_error(context: &str, err: &JsValue) {
    tracing::error!("{context}: {err:?}");
}

impl MapApp {
    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            let result = match effect {
                Effect::Redraw => self.dom.redraw(self.view.surface(), self.view.label_style()),
                Effect::Restyle(key) => self.dom.restyle(self.view.surface(), key),
                Effect::Tooltip => self.dom.sync_tooltip(self.view.surface().tooltip()),
                Effect::Notice(text) => self.dom.notice(&text),
                Effect::Navigate(url) => navigate(&url),
                Effect::FetchBoundary(ticket) => {
                    spawn_boundary_fetch(Rc::clone(&self.loader), ticket);
                    Ok(())
                }
            };
            if let Err(err) = result {
                log_js_error("failed to update the map", &err);
            }
        }
        self.schedule_frame();
    }

    fn schedule_frame(&mut self) {
        if self.raf_pending || !self.view.is_animating() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        let callback = Closure::once_into_js(move |timestamp: f64| on_frame(timestamp));
        match window.request_animation_frame(callback.unchecked_ref()) {
            Ok(_) => self.raf_pending = true,
            Err(err) => log_js_error("requestAnimationFrame failed", &err),
        }
    }
}

fn navigate(url: &str) -> Result<(), JsValue> {
    match web_sys::window() {
        Some(window) => window.location().set_href(url),
        None => Ok(()),
    }
}

fn on_frame(timestamp: f64) {
    with_app(|app| {
        app.raf_pending = false;
        app.frame = app.frame.next_at(Time::from_millis(timestamp));
        let effects = app.view.tick(app.frame, &mut app.dom);
        app.apply(effects);
    });
}

fn spawn_boundary_fetch(loader: Rc<DataLoader<GlooFetch>>, ticket: LoadTicket) {
    spawn_local(async move {
        let response = fetch_boundaries(&loader, ticket).await;
        with_app(|app| {
            let effects = app.view.boundaries_loaded(response);
            app.apply(effects);
        });
    });
}

/// Feature key of the element under the event, if it is a map feature.
fn event_feature(event: &MouseEvent) -> Option<FeatureKey> {
    let target: Element = event.target()?.dyn_into().ok()?;
    FeatureKey::parse(&target.get_attribute(FEATURE_ATTR)?)
}

fn listen<E, F>(target: &web_sys::EventTarget, kind: &str, handler: F) -> Result<(), JsValue>
where
    E: FromWasmAbi + 'static,
    F: FnMut(E) + 'static,
{
    let closure = Closure::<dyn FnMut(E)>::new(handler);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    // Listeners live as long as the page.
    closure.forget();
    Ok(())
}

fn attach_map_listeners(svg: &Element) -> Result<(), JsValue> {
    listen(svg, "mouseover", |event: MouseEvent| {
        let Some(key) = event_feature(&event) else {
            return;
        };
        with_app(|app| {
            let at = app.dom.local_point(event.client_x().into(), event.client_y().into());
            let effects = app.view.hover(key, at);
            app.apply(effects);
        });
    })?;

    listen(svg, "mouseout", |event: MouseEvent| {
        let Some(key) = event_feature(&event) else {
            return;
        };
        with_app(|app| {
            let effects = app.view.leave(key);
            app.apply(effects);
        });
    })?;

    listen(svg, "mousedown", |event: MouseEvent| {
        with_app(|app| {
            let at = app.dom.local_point(event.client_x().into(), event.client_y().into());
            app.drag = Some(DragTracker::start(at));
        });
    })?;

    listen(svg, "mousemove", |event: MouseEvent| {
        let key = event_feature(&event);
        with_app(|app| {
            let at = app.dom.local_point(event.client_x().into(), event.client_y().into());
            if let Some(drag) = app.drag.as_mut()
                && let Some(delta) = drag.move_to(at)
            {
                app.view.pan(delta.x, delta.y, &mut app.dom);
            }
            if let Some(key) = key {
                let effects = app.view.pointer_move(key, at);
                app.apply(effects);
            }
        });
    })?;

    listen(svg, "mouseup", |_event: MouseEvent| {
        with_app(|app| {
            if let Some(drag) = app.drag.take() {
                app.suppress_click = drag.suppresses_click();
            }
        });
    })?;

    listen(svg, "mouseleave", |_event: MouseEvent| {
        with_app(|app| app.drag = None);
    })?;

    listen(svg, "click", |event: MouseEvent| {
        let key = event_feature(&event);
        with_app(|app| {
            if std::mem::take(&mut app.suppress_click) {
                return;
            }
            if let Some(key) = key {
                let effects = app.view.click(key, now());
                app.apply(effects);
            }
        });
    })?;

    listen(svg, "wheel", |event: WheelEvent| {
        event.prevent_default();
        with_app(|app| {
            let at = app.dom.local_point(event.client_x().into(), event.client_y().into());
            let delta = wheel_delta_px(event.delta_y(), event.delta_mode());
            app.view.wheel(at, delta, &mut app.dom);
        });
    })?;

    Ok(())
}

fn attach_button(
    document: &web_sys::Document,
    id: &str,
    action: fn(&mut MapApp),
) -> Result<(), JsValue> {
    let Some(button) = document.get_element_by_id(id) else {
        tracing::debug!(id, "button not present");
        return Ok(());
    };
    listen(&button, "click", move |_event: MouseEvent| {
        with_app(action);
    })
}

fn zoom_in(app: &mut MapApp) {
    if app.view.zoom_in(now()) {
        app.schedule_frame();
    }
}

fn zoom_out(app: &mut MapApp) {
    if app.view.zoom_out(now()) {
        app.schedule_frame();
    }
}

fn back_to_world(app: &mut MapApp) {
    let effects = app.view.back(now());
    app.apply(effects);
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Mounts the map. `config_json` is an optional JSON object overriding
/// [`MapConfig`] defaults.
#[wasm_bindgen]
pub fn start_travel_map(config_json: Option<String>) -> Result<(), JsValue> {
    let config = match config_json.as_deref() {
        Some(json) => {
            MapConfig::from_json_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?
        }
        None => MapConfig::default(),
    };
    logging::init(&config.log_level);

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let container = document
        .get_element_by_id(&config.container_id)
        .ok_or_else(|| JsValue::from_str(&format!("no element #{}", config.container_id)))?;

    let width = config.viewport_width.unwrap_or_else(|| {
        let w = f64::from(container.client_width());
        if w > 0.0 { w } else { FALLBACK_WIDTH }
    });
    let viewport = [width, config.viewport_height];
    let dom = MapDom::mount(document.clone(), &container, viewport, &config.palette.label)?;

    attach_map_listeners(dom.svg())?;
    attach_button(&document, "zoom-in", zoom_in)?;
    attach_button(&document, "zoom-out", zoom_out)?;
    attach_button(&document, "back-to-world", back_to_world)?;

    spawn_local(async move {
        let loader = Rc::new(loader_for(&config, GlooFetch));
        let (view, effects) = boot(config, viewport, &loader).await;
        tracing::info!(features = view.surface().features().len(), "travel map ready");
        APP.with(|cell| {
            *cell.borrow_mut() = Some(MapApp {
                view,
                loader,
                dom,
                frame: Frame::new(0, now()),
                raf_pending: false,
                drag: None,
                suppress_click: false,
            });
        });
        with_app(|app| app.apply(effects));
    });

    Ok(())
}
