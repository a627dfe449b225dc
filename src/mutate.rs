//! In-place edit controller: replace a widget's text value or swap its
//! attached media, round-tripped through the upstream CMS.
//!
//! Upstream accepts only whole-structure updates, so every mutation re-emits
//! the full option list with one value changed. The local document is only
//! touched after upstream accepts; on failure the prior scene state stands.

use tracing::info;

use crate::client::{CmsClient, WidgetUpdatePayload};
use crate::error::{VitrineError, VitrineResult};
use crate::model::{LayoutDocument, MediaId, ModuleKind, WidgetId};
use crate::options::{self, DecodedOptions};
use crate::resolve::{SubResourceCache, SubResourceKey, ViewToken};
use crate::scene::{Scene, SceneConfig, Viewport, build_scene};

/// Replaces a widget's scalar text value and rebuilds the scene.
///
/// `element_id` targets a canvas element; the underlying platform does not
/// support editing those through the widget API, so any element-targeted edit
/// (and any edit on a canvas/global widget) is refused with
/// `UnsupportedEditTarget` before upstream is contacted. The UI routes those
/// to the upstream editor deliberately.
pub async fn apply_text_edit<C: CmsClient>(
    client: &C,
    cache: &SubResourceCache,
    token: ViewToken,
    layout: &mut LayoutDocument,
    viewport: Viewport,
    config: &SceneConfig,
    widget_id: WidgetId,
    element_id: Option<&str>,
    new_value: &str,
) -> VitrineResult<Scene> {
    let (_, widget) = layout
        .widget(widget_id)
        .ok_or_else(|| VitrineError::mutation(format!("widget {widget_id} not in layout")))?;

    let decoded = options::decode(widget);
    refuse_canvas_targets(widget_id, &widget.module_kind, &decoded, element_id)?;

    let new_options = options::replace_scalar_text(&widget.raw_options, new_value);
    let payload = WidgetUpdatePayload {
        options: new_options.clone(),
        media_ids: widget.attached_media_ids.clone(),
    };

    client
        .submit_widget_update(widget_id, &payload)
        .await
        .map_err(|e| VitrineError::mutation(format!("upstream rejected text edit: {e}")))?;

    info!(%widget_id, "text edit accepted upstream");
    if let Some(widget) = layout.widget_mut(widget_id) {
        widget.raw_options = new_options;
    }
    invalidate_widget_refs(cache, token, &decoded).await;
    build_scene(layout, viewport, config)
}

/// Swaps the widget's attached media for a single new id and rebuilds the
/// scene. The preview renders only the primary attachment, so the swap
/// replaces the whole attachment list.
pub async fn apply_media_swap<C: CmsClient>(
    client: &C,
    cache: &SubResourceCache,
    token: ViewToken,
    layout: &mut LayoutDocument,
    viewport: Viewport,
    config: &SceneConfig,
    widget_id: WidgetId,
    new_media_id: MediaId,
) -> VitrineResult<Scene> {
    let (_, widget) = layout
        .widget(widget_id)
        .ok_or_else(|| VitrineError::mutation(format!("widget {widget_id} not in layout")))?;

    let decoded = options::decode(widget);
    refuse_canvas_targets(widget_id, &widget.module_kind, &decoded, None)?;

    let payload = WidgetUpdatePayload {
        options: widget.raw_options.clone(),
        media_ids: vec![new_media_id],
    };

    client
        .submit_widget_update(widget_id, &payload)
        .await
        .map_err(|e| VitrineError::mutation(format!("upstream rejected media swap: {e}")))?;

    info!(%widget_id, %new_media_id, "media swap accepted upstream");
    if let Some(widget) = layout.widget_mut(widget_id) {
        widget.attached_media_ids = vec![new_media_id];
    }
    invalidate_widget_refs(cache, token, &decoded).await;
    build_scene(layout, viewport, config)
}

fn refuse_canvas_targets(
    widget_id: WidgetId,
    kind: &ModuleKind,
    decoded: &DecodedOptions,
    element_id: Option<&str>,
) -> VitrineResult<()> {
    if let Some(element_id) = element_id {
        return Err(VitrineError::unsupported_edit(format!(
            "canvas element '{element_id}' cannot be edited through the widget API"
        )));
    }
    if *kind == ModuleKind::Canvas || !decoded.canvas_elements.is_empty() {
        return Err(VitrineError::unsupported_edit(format!(
            "widget {widget_id} is a canvas/global widget; edit it in the upstream editor"
        )));
    }
    Ok(())
}

async fn invalidate_widget_refs(
    cache: &SubResourceCache,
    token: ViewToken,
    decoded: &DecodedOptions,
) {
    if let Some(sub) = &decoded.sub_playlist {
        cache
            .invalidate(token, SubResourceKey::Playlist(sub.playlist_id))
            .await;
    }
    if let Some(ds) = &decoded.dataset {
        cache
            .invalidate(token, SubResourceKey::Dataset(ds.dataset_id))
            .await;
    }
}
