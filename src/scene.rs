//! Scene builder: flattens a layout's region tree into positioned, scaled
//! scene nodes the UI can render directly.
//!
//! Only the first widget of each region is previewed; the rest is reported as
//! an overflow count. That is a deliberate simplification of the upstream
//! multi-widget timeline model, not a bug.

use crate::error::{VitrineError, VitrineResult};
use crate::model::{
    LayoutDocument, LayoutId, MediaId, ModuleKind, PlaylistId, Rect, RegionId, Widget, WidgetId,
};
use crate::options::{self, CanvasElement, DecodedOptions};
use crate::resolve::SubResourceKey;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Builder configuration. `target_fill_ratio` deliberately under-fills the
/// viewport (< 1) so multi-region layouts stay legible around the edges; it is
/// a product choice, not a derived optimum, which is why it lives here instead
/// of inline in the scale computation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneConfig {
    pub target_fill_ratio: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            target_fill_ratio: 0.9,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum RenderStrategy {
    /// The builder synthesizes the visual content itself.
    DirectRender,
    /// Content requires externally rendered HTML, proxied through an iframe.
    IframeProxy,
}

/// A canvas element together with its geometry scaled into viewport space.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PlacedElement {
    pub element: CanvasElement,
    pub scaled_geometry: Rect,
}

/// What `DirectRender` draws for the primary widget.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub enum SceneContent {
    Image { media_id: Option<MediaId> },
    Video { media_id: Option<MediaId> },
    Text { value: Option<String> },
    Canvas { elements: Vec<PlacedElement> },
    SubPlaylist { playlist_id: PlaylistId },
    /// Iframe-proxied content; upstream renders the HTML.
    External,
    /// Unknown module kind or an undecodable reference.
    Placeholder,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct PrimaryWidget {
    pub widget_id: WidgetId,
    pub module_kind: ModuleKind,
    pub content: SceneContent,
    /// Sub-resources this widget references; resolved lazily by the caller
    /// and invalidated after mutations.
    pub sub_resources: Vec<SubResourceKey>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct SceneNode {
    pub region_id: RegionId,
    pub scaled_geometry: Rect,
    pub render_strategy: RenderStrategy,
    /// `None` for a region with zero widgets, which still renders as an
    /// explicitly empty placeholder (stable node count per region).
    pub primary_widget: Option<PrimaryWidget>,
    pub overflow_count: u32,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct Scene {
    pub layout_id: LayoutId,
    pub scale: f64,
    pub nodes: Vec<SceneNode>,
}

impl Scene {
    /// Distinct sub-resource keys referenced by the scene, in first-appearance
    /// order. Drives lazy resolution and post-mutation invalidation.
    pub fn sub_resource_refs(&self) -> Vec<SubResourceKey> {
        let mut out = Vec::new();
        for node in &self.nodes {
            let Some(widget) = &node.primary_widget else {
                continue;
            };
            for key in &widget.sub_resources {
                if !out.contains(key) {
                    out.push(*key);
                }
            }
        }
        out
    }
}

/// Builds the flat scene for one layout at one viewport size. One node per
/// region, in region order, no matter how many widgets the region holds.
pub fn build_scene(
    layout: &LayoutDocument,
    viewport: Viewport,
    config: &SceneConfig,
) -> VitrineResult<Scene> {
    layout.validate()?;
    if !(viewport.width > 0.0) || !(viewport.height > 0.0) {
        return Err(VitrineError::validation("viewport width/height must be > 0"));
    }

    let scale = (viewport.width / layout.width).min(viewport.height / layout.height)
        * config.target_fill_ratio;

    let nodes = layout
        .regions
        .iter()
        .map(|region| {
            // Clamp before scaling so partial/out-of-bounds region data can
            // never push scaled geometry outside the viewport.
            let scaled_geometry = region
                .geometry
                .clamped_to(layout.width, layout.height)
                .scaled(scale);

            let first = region.widgets.first();
            SceneNode {
                region_id: region.id,
                scaled_geometry,
                render_strategy: first
                    .map(|w| classify_strategy(&w.module_kind))
                    .unwrap_or(RenderStrategy::DirectRender),
                primary_widget: first.map(|w| primary_widget(w, scale)),
                overflow_count: region.widgets.len().saturating_sub(1) as u32,
            }
        })
        .collect();

    Ok(Scene {
        layout_id: layout.id,
        scale,
        nodes,
    })
}

/// Kinds known to require externally rendered HTML. Everything else is drawn
/// by the builder itself.
fn classify_strategy(kind: &ModuleKind) -> RenderStrategy {
    match kind {
        ModuleKind::Dataset | ModuleKind::Embedded | ModuleKind::Ticker => {
            RenderStrategy::IframeProxy
        }
        _ => RenderStrategy::DirectRender,
    }
}

fn primary_widget(widget: &Widget, scale: f64) -> PrimaryWidget {
    let decoded = options::decode(widget);
    let content = synthesize_content(widget, &decoded, scale);

    let mut sub_resources = Vec::new();
    if let Some(sub) = &decoded.sub_playlist {
        sub_resources.push(SubResourceKey::Playlist(sub.playlist_id));
    }
    if let Some(ds) = &decoded.dataset {
        sub_resources.push(SubResourceKey::Dataset(ds.dataset_id));
    }

    PrimaryWidget {
        widget_id: widget.id,
        module_kind: widget.module_kind.clone(),
        content,
        sub_resources,
    }
}

fn synthesize_content(widget: &Widget, decoded: &DecodedOptions, scale: f64) -> SceneContent {
    match &widget.module_kind {
        ModuleKind::Image => SceneContent::Image {
            media_id: widget.attached_media_ids.first().copied(),
        },
        ModuleKind::Video => SceneContent::Video {
            media_id: widget.attached_media_ids.first().copied(),
        },
        ModuleKind::Text => SceneContent::Text {
            value: decoded.scalar_text.clone(),
        },
        ModuleKind::Canvas => SceneContent::Canvas {
            elements: decoded
                .canvas_elements
                .iter()
                .map(|el| PlacedElement {
                    element: el.clone(),
                    scaled_geometry: el.geometry.scaled(scale),
                })
                .collect(),
        },
        ModuleKind::Playlist | ModuleKind::SubPlaylist => match &decoded.sub_playlist {
            Some(sub) => SceneContent::SubPlaylist {
                playlist_id: sub.playlist_id,
            },
            None => SceneContent::Placeholder,
        },
        // Iframe kinds: upstream renders the HTML, but a dataset widget whose
        // reference did not decode has nothing to proxy and degrades to a
        // placeholder (the strategy stays keyed on the module kind).
        ModuleKind::Dataset => match &decoded.dataset {
            Some(_) => SceneContent::External,
            None => SceneContent::Placeholder,
        },
        ModuleKind::Embedded | ModuleKind::Ticker => SceneContent::External,
        ModuleKind::Clock | ModuleKind::Other(_) => SceneContent::Placeholder,
    }
}
