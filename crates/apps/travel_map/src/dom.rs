//! Mirrors the [`Surface`] model into SVG and HTML elements.

use foundation::math::Vec2;
use layers::LabelStyle;
use runtime::{TransformSink, ZoomTransform};
use scene::{FeatureKey, FeatureKind, ScreenText, Surface};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Attribute carrying a feature's [`FeatureKey`].
pub const FEATURE_ATTR: &str = "data-feature";

pub struct MapDom {
    document: Document,
    svg: Element,
    layer: Element,
    status: Element,
    tooltip: HtmlElement,
    back: Option<HtmlElement>,
    notice: Option<HtmlElement>,
    paths: Vec<Element>,
    generation: u64,
    label_color: String,
}

fn set_display(el: &HtmlElement, visible: bool) -> Result<(), JsValue> {
    el.style()
        .set_property("display", if visible { "block" } else { "none" })
}

fn is_static_position(position: &str) -> bool {
    matches!(position.trim(), "" | "static")
}

/// Tooltip coordinates are relative to the SVG, so the container must be
/// the tooltip's offset parent.
fn make_positioned(container: &Element) -> Result<(), JsValue> {
    let Some(window) = web_sys::window() else {
        return Ok(());
    };
    let position = window
        .get_computed_style(container)?
        .map(|style| style.get_property_value("position"))
        .transpose()?
        .unwrap_or_default();
    if is_static_position(&position)
        && let Some(el) = container.dyn_ref::<HtmlElement>()
    {
        el.style().set_property("position", "relative")?;
    }
    Ok(())
}

fn html_by_id(document: &Document, id: &str) -> Option<HtmlElement> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
}

impl MapDom {
    /// Appends the SVG, its zoom layer, the status text and the tooltip to
    /// `container`.
    pub fn mount(
        document: Document,
        container: &Element,
        viewport: [f64; 2],
        label_color: &str,
    ) -> Result<Self, JsValue> {
        let svg = document.create_element_ns(Some(SVG_NS), "svg")?;
        svg.set_attribute("width", &viewport[0].to_string())?;
        svg.set_attribute("height", &viewport[1].to_string())?;
        svg.set_attribute("class", "travel-map")?;

        let layer = document.create_element_ns(Some(SVG_NS), "g")?;
        svg.append_child(&layer)?;

        let status = document.create_element_ns(Some(SVG_NS), "text")?;
        status.set_attribute("text-anchor", "middle")?;
        status.set_attribute("font-size", "18px")?;
        status.set_attribute("display", "none")?;
        svg.append_child(&status)?;

        container.append_child(&svg)?;
        make_positioned(container)?;

        let tooltip: HtmlElement = document.create_element("div")?.dyn_into()?;
        tooltip.set_class_name("map-tooltip");
        let style = tooltip.style();
        style.set_property("position", "absolute")?;
        style.set_property("pointer-events", "none")?;
        style.set_property("display", "none")?;
        container.append_child(&tooltip)?;

        let back = html_by_id(&document, "back-to-world");
        if let Some(back) = &back {
            set_display(back, false)?;
        }
        let notice = html_by_id(&document, "map-notice");

        Ok(Self {
            document,
            svg,
            layer,
            status,
            tooltip,
            back,
            notice,
            paths: Vec::new(),
            generation: 0,
            label_color: label_color.to_string(),
        })
    }

    pub fn svg(&self) -> &Element {
        &self.svg
    }

    /// Pointer position relative to the SVG's top-left corner.
    pub fn local_point(&self, client_x: f64, client_y: f64) -> Vec2 {
        let rect = self.svg.get_bounding_client_rect();
        Vec2::new(client_x - rect.left(), client_y - rect.top())
    }

    /// Clears the zoom layer and repopulates it from `surface`. Any notice
    /// from the previous view is hidden.
    pub fn redraw(&mut self, surface: &Surface, label_style: &LabelStyle) -> Result<(), JsValue> {
        self.layer.set_inner_html("");
        self.paths.clear();
        self.generation = surface.generation();

        let stroke = surface.stroke();
        for feature in surface.features() {
            let path = self.document.create_element_ns(Some(SVG_NS), "path")?;
            path.set_attribute("d", &feature.path)?;
            path.set_attribute("fill", &feature.fill)?;
            path.set_attribute(FEATURE_ATTR, &feature.key.to_string())?;
            let class = match feature.kind {
                FeatureKind::Country { .. } => "country",
                FeatureKind::Region { .. } => "boundary",
            };
            path.set_attribute("class", class)?;
            if let Some(stroke) = stroke {
                path.set_attribute("stroke", &stroke.color)?;
                path.set_attribute("stroke-width", &stroke.width.to_string())?;
            }
            self.layer.append_child(&path)?;
            self.paths.push(path);
        }

        for label in surface.labels() {
            let text = self.document.create_element_ns(Some(SVG_NS), "text")?;
            text.set_attribute("class", "region-label")?;
            text.set_attribute("x", &label.position.x.to_string())?;
            text.set_attribute("y", &label.position.y.to_string())?;
            text.set_attribute("text-anchor", "middle")?;
            text.set_attribute("font-size", &format!("{}px", label.font_px))?;
            text.set_attribute("font-family", &label_style.font_family)?;
            text.set_attribute("font-weight", &label_style.font_weight)?;
            text.set_attribute("fill", &self.label_color)?;
            text.set_attribute("pointer-events", "none")?;
            text.set_text_content(Some(&label.text));
            self.layer.append_child(&text)?;
        }

        self.sync_status(surface.status())?;
        self.sync_tooltip(surface.tooltip())?;
        if let Some(back) = &self.back {
            set_display(back, surface.back_visible())?;
        }
        if let Some(notice) = &self.notice {
            set_display(notice, false)?;
        }
        Ok(())
    }

    /// Updates one feature's fill in place.
    pub fn restyle(&self, surface: &Surface, key: FeatureKey) -> Result<(), JsValue> {
        if key.generation != self.generation {
            return Ok(());
        }
        match (surface.feature(key), self.paths.get(key.index)) {
            (Some(feature), Some(path)) => path.set_attribute("fill", &feature.fill),
            _ => Ok(()),
        }
    }

    fn sync_status(&self, status: Option<&ScreenText>) -> Result<(), JsValue> {
        match status {
            Some(status) => {
                self.status.set_attribute("x", &status.position.x.to_string())?;
                self.status.set_attribute("y", &status.position.y.to_string())?;
                self.status.set_text_content(Some(&status.text));
                self.status.set_attribute("display", "inline")
            }
            None => self.status.set_attribute("display", "none"),
        }
    }

    pub fn sync_tooltip(&self, tooltip: Option<&ScreenText>) -> Result<(), JsValue> {
        let style = self.tooltip.style();
        match tooltip {
            Some(tip) => {
                self.tooltip.set_text_content(Some(&tip.text));
                style.set_property("left", &format!("{}px", tip.position.x + 12.0))?;
                style.set_property("top", &format!("{}px", tip.position.y + 12.0))?;
                style.set_property("display", "block")
            }
            None => style.set_property("display", "none"),
        }
    }

    /// Shows `text` in the notice element, or as an alert without one.
    pub fn notice(&self, text: &str) -> Result<(), JsValue> {
        match &self.notice {
            Some(el) => {
                el.set_text_content(Some(text));
                set_display(el, true)
            }
            None => match web_sys::window() {
                Some(window) => window.alert_with_message(text),
                None => Ok(()),
            },
        }
    }
}

impl TransformSink for MapDom {
    fn set_transform(&mut self, transform: &ZoomTransform) {
        if let Err(err) = self.layer.set_attribute("transform", &transform.to_svg()) {
            tracing::warn!(?err, "failed to apply zoom transform");
        }
    }
}
