//! Decoder for the upstream widget option bag.
//!
//! Upstream sends an ordered list of `{option, value}` pairs where `value` is
//! dynamically typed: plain scalars sit next to JSON-encoded sub-documents
//! (sub-playlist references, canvas element pages). Decoding is total — a
//! malformed value is logged and treated as absent, never raised — and pure,
//! so running it twice on the same input yields identical output.

use serde_json::Value;
use tracing::debug;

use crate::model::{DatasetId, MediaId, OptionPair, PlaylistId, Rect, Widget};

pub const OPT_TEXT: &str = "text";
pub const OPT_TICKER_TEXT: &str = "ta_text";
pub const OPT_SUB_PLAYLISTS: &str = "subPlaylists";
pub const OPT_DATASET_ID: &str = "dataSetId";
pub const OPT_ELEMENTS: &str = "elements";

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CanvasElementKind {
    Text,
    Image,
    Video,
}

/// A freely positioned element inside a canvas/global widget. Addressable for
/// editing by `element_id`, not by the owning widget id.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CanvasElement {
    pub element_id: String,
    pub kind: CanvasElementKind,
    pub geometry: Rect,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub media_id: Option<MediaId>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub font_color: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SubPlaylistRef {
    pub playlist_id: PlaylistId,
    /// True when the reference came from the widget's overloaded direct
    /// `playlist_id` field rather than a `subPlaylists` option. Upstream uses
    /// that field for two different semantics, so callers should treat the
    /// fallback as lower-confidence.
    pub direct_field_fallback: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct DatasetRef {
    pub dataset_id: DatasetId,
}

/// Typed view of a widget's option bag. Derived on demand, never stored.
#[derive(Clone, Debug, PartialEq, Default, serde::Serialize)]
pub struct DecodedOptions {
    pub scalar_text: Option<String>,
    pub sub_playlist: Option<SubPlaylistRef>,
    pub dataset: Option<DatasetRef>,
    pub canvas_elements: Vec<CanvasElement>,
}

/// One option pair classified by name. `Unknown` keeps unrecognized options
/// intact for forward compatibility and round-tripping.
#[derive(Clone, Debug)]
pub enum WidgetOption {
    Text(String),
    SubPlaylists(Vec<SubPlaylistEntry>),
    DataSetId(DatasetId),
    Elements(Vec<CanvasElement>),
    Unknown { name: String, value: Value },
}

#[derive(Clone, Copy, Debug, serde::Deserialize)]
pub struct SubPlaylistEntry {
    #[serde(rename = "playlistId")]
    pub playlist_id: PlaylistId,
}

/// Decodes a widget's option bag into typed fields. Total function: malformed
/// JSON in any individual option is recovered locally (the option is treated
/// as absent) and the rest of the bag still decodes.
pub fn decode(widget: &Widget) -> DecodedOptions {
    let mut out = DecodedOptions::default();

    for pair in &widget.raw_options {
        match classify(pair) {
            WidgetOption::Text(text) => {
                if out.scalar_text.is_none() {
                    out.scalar_text = Some(text);
                }
            }
            WidgetOption::SubPlaylists(entries) => {
                if out.sub_playlist.is_none()
                    && let Some(first) = entries.first()
                {
                    out.sub_playlist = Some(SubPlaylistRef {
                        playlist_id: first.playlist_id,
                        direct_field_fallback: false,
                    });
                }
            }
            WidgetOption::DataSetId(dataset_id) => {
                if out.dataset.is_none() {
                    out.dataset = Some(DatasetRef { dataset_id });
                }
            }
            WidgetOption::Elements(elements) => {
                if out.canvas_elements.is_empty() {
                    out.canvas_elements = elements;
                }
            }
            WidgetOption::Unknown { .. } => {}
        }
    }

    // The overloaded direct field is only consulted when no subPlaylists
    // option resolved; see `SubPlaylistRef::direct_field_fallback`.
    if out.sub_playlist.is_none()
        && let Some(playlist_id) = widget.playlist_id
    {
        out.sub_playlist = Some(SubPlaylistRef {
            playlist_id,
            direct_field_fallback: true,
        });
    }

    out
}

/// Classifies one option pair. Parse failures degrade to `Unknown`.
pub fn classify(pair: &OptionPair) -> WidgetOption {
    match pair.option.as_str() {
        OPT_TEXT | OPT_TICKER_TEXT => match &pair.value {
            Value::String(s) => WidgetOption::Text(s.clone()),
            other => unknown(pair, format!("text option holds {}", kind_of(other))),
        },
        OPT_SUB_PLAYLISTS => match nested_json(&pair.value) {
            Some(nested) => match serde_json::from_value::<Vec<SubPlaylistEntry>>(nested) {
                Ok(entries) if !entries.is_empty() => WidgetOption::SubPlaylists(entries),
                Ok(_) => unknown(pair, "subPlaylists array is empty".to_string()),
                Err(e) => unknown(pair, format!("subPlaylists entries malformed: {e}")),
            },
            None => unknown(pair, "subPlaylists value is not JSON".to_string()),
        },
        OPT_DATASET_ID => match dataset_id(&pair.value) {
            Some(id) => WidgetOption::DataSetId(id),
            None => unknown(pair, "dataSetId is not a numeric id".to_string()),
        },
        OPT_ELEMENTS => match nested_json(&pair.value) {
            Some(nested) => WidgetOption::Elements(extract_elements(&nested)),
            None => unknown(pair, "elements value is not JSON".to_string()),
        },
        _ => WidgetOption::Unknown {
            name: pair.option.clone(),
            value: pair.value.clone(),
        },
    }
}

/// Re-emits the full option list with only the scalar text value replaced.
/// Upstream does not accept partial updates, so every other pair is carried
/// verbatim. Appends a `text` option when none exists yet.
pub fn replace_scalar_text(raw: &[OptionPair], new_value: &str) -> Vec<OptionPair> {
    let mut out = raw.to_vec();
    let target = out
        .iter_mut()
        .find(|p| p.option == OPT_TEXT || p.option == OPT_TICKER_TEXT);
    match target {
        Some(pair) => pair.value = Value::String(new_value.to_string()),
        None => out.push(OptionPair::new(OPT_TEXT, Value::String(new_value.to_string()))),
    }
    out
}

/// Unwraps one level of JSON-in-JSON: structured values pass through, string
/// values are parsed. Returns `None` (recovered, logged) on a parse failure.
fn nested_json(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => match serde_json::from_str(s) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(error = %e, "option value is not valid nested JSON; treating as absent");
                None
            }
        },
        Value::Array(_) | Value::Object(_) => Some(value.clone()),
        _ => None,
    }
}

fn dataset_id(value: &Value) -> Option<DatasetId> {
    match value {
        Value::Number(n) => n.as_u64().map(DatasetId),
        Value::String(s) => s.trim().parse::<u64>().ok().map(DatasetId),
        _ => None,
    }
}

fn unknown(pair: &OptionPair, reason: String) -> WidgetOption {
    debug!(option = %pair.option, %reason, "option not decodable; treating as absent");
    WidgetOption::Unknown {
        name: pair.option.clone(),
        value: pair.value.clone(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// Wire shape of the canvas `elements` option: an array of pages, each holding
// an `elements` collection of typed, positioned children.

#[derive(serde::Deserialize)]
struct WirePage {
    #[serde(default)]
    elements: Vec<WireElement>,
}

#[derive(serde::Deserialize)]
struct WireElement {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "type")]
    type_tag: Option<String>,
    #[serde(default, rename = "elementId")]
    element_id: Option<String>,
    #[serde(default)]
    left: f64,
    #[serde(default)]
    top: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, rename = "mediaId")]
    media_id: Option<MediaId>,
    #[serde(default, rename = "fontSize")]
    font_size: Option<f64>,
    #[serde(default, rename = "fontColor")]
    font_color: Option<String>,
}

/// Flattens the page structure in source order. Elements whose tag matches
/// neither text, image nor video are dropped silently: that is intentional
/// filtering of element types the preview cannot synthesize.
fn extract_elements(nested: &Value) -> Vec<CanvasElement> {
    let pages: Vec<WirePage> = match serde_json::from_value(nested.clone()) {
        Ok(pages) => pages,
        Err(e) => {
            debug!(error = %e, "canvas elements structure malformed; treating as absent");
            return Vec::new();
        }
    };

    let mut out = Vec::new();
    for page in pages {
        for el in page.elements {
            let tag = el
                .id
                .as_deref()
                .or(el.type_tag.as_deref())
                .unwrap_or_default();
            let Some(kind) = classify_element_tag(tag) else {
                continue;
            };
            // Synthesized ids number the emitted elements, so they stay
            // unique across pages.
            let element_id = el
                .element_id
                .unwrap_or_else(|| format!("{tag}_{}", out.len()));
            out.push(CanvasElement {
                element_id,
                kind,
                geometry: Rect::new(el.left, el.top, el.width, el.height),
                text: el.text,
                media_id: el.media_id,
                font_size: el.font_size,
                font_color: el.font_color,
            });
        }
    }
    out
}

fn classify_element_tag(tag: &str) -> Option<CanvasElementKind> {
    // Tags arrive as e.g. "text", "global_image", "video_element".
    if tag.contains("text") {
        Some(CanvasElementKind::Text)
    } else if tag.contains("image") {
        Some(CanvasElementKind::Image)
    } else if tag.contains("video") {
        Some(CanvasElementKind::Video)
    } else {
        None
    }
}
