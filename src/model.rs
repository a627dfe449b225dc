use crate::error::{VitrineError, VitrineResult};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(LayoutId);
id_newtype!(RegionId);
id_newtype!(WidgetId);
id_newtype!(MediaId);
id_newtype!(PlaylistId);
id_newtype!(DatasetId);

/// Axis-aligned rectangle in layout-native units (unscaled).
#[derive(Clone, Copy, Debug, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            x: self.x * scale,
            y: self.y * scale,
            width: self.width * scale,
            height: self.height * scale,
        }
    }

    /// Clamps the rect into `[0,0]..[bound_w,bound_h]`, shrinking rather than
    /// shifting. Degenerate inputs collapse to zero-size rects.
    pub fn clamped_to(&self, bound_w: f64, bound_h: f64) -> Self {
        let x = self.x.clamp(0.0, bound_w);
        let y = self.y.clamp(0.0, bound_h);
        let width = self.width.max(0.0).min(bound_w - x);
        let height = self.height.max(0.0).min(bound_h - y);
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Lifecycle state of a layout document in the upstream CMS.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishState {
    Published,
    Draft,
}

/// Open string enum of widget module kinds. Unrecognized kinds survive as
/// `Other` and render as a generic placeholder downstream.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModuleKind {
    Image,
    Video,
    Text,
    Dataset,
    Playlist,
    SubPlaylist,
    Canvas,
    Clock,
    Embedded,
    Ticker,
    Other(String),
}

impl From<String> for ModuleKind {
    fn from(s: String) -> Self {
        // Upstream spells the canvas module "global" in older documents.
        match s.as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            "text" => Self::Text,
            "dataset" | "datasetview" => Self::Dataset,
            "playlist" => Self::Playlist,
            "subplaylist" => Self::SubPlaylist,
            "canvas" | "global" => Self::Canvas,
            "clock" => Self::Clock,
            "embedded" => Self::Embedded,
            "ticker" => Self::Ticker,
            _ => Self::Other(s),
        }
    }
}

impl From<ModuleKind> for String {
    fn from(kind: ModuleKind) -> Self {
        match kind {
            ModuleKind::Image => "image".to_string(),
            ModuleKind::Video => "video".to_string(),
            ModuleKind::Text => "text".to_string(),
            ModuleKind::Dataset => "dataset".to_string(),
            ModuleKind::Playlist => "playlist".to_string(),
            ModuleKind::SubPlaylist => "subplaylist".to_string(),
            ModuleKind::Canvas => "canvas".to_string(),
            ModuleKind::Clock => "clock".to_string(),
            ModuleKind::Embedded => "embedded".to_string(),
            ModuleKind::Ticker => "ticker".to_string(),
            ModuleKind::Other(s) => s,
        }
    }
}

/// One entry of the upstream option bag. `value` is arbitrary JSON: upstream
/// usually sends strings, several of which are themselves JSON-encoded
/// documents that the decoder unwraps.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OptionPair {
    pub option: String,
    pub value: serde_json::Value,
}

impl OptionPair {
    pub fn new(option: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            option: option.into(),
            value,
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Widget {
    pub id: WidgetId,
    pub module_kind: ModuleKind,
    #[serde(default)]
    pub raw_options: Vec<OptionPair>,
    #[serde(default)]
    pub attached_media_ids: Vec<MediaId>,
    /// Overloaded upstream field: either the widget's own id within its parent
    /// playlist or a real cross-reference. The decoder treats it as a
    /// lower-confidence fallback only.
    #[serde(default)]
    pub playlist_id: Option<PlaylistId>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub geometry: Rect,
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

/// Root layout entity. Owned by the upstream CMS; fetched fresh per view and
/// never persisted locally beyond the active session.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LayoutDocument {
    pub id: LayoutId,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub background_ref: Option<MediaId>,
    #[serde(default)]
    pub duration_seconds: f64,
    pub publish_state: PublishState,
    #[serde(default)]
    pub parent_id: Option<LayoutId>,
    #[serde(default)]
    pub regions: Vec<Region>,
}

impl LayoutDocument {
    pub fn validate(&self) -> VitrineResult<()> {
        if !(self.width > 0.0) || !(self.height > 0.0) {
            return Err(VitrineError::validation("layout width/height must be > 0"));
        }
        for region in &self.regions {
            if region.geometry.width < 0.0 || region.geometry.height < 0.0 {
                return Err(VitrineError::validation(format!(
                    "region {} has negative dimensions",
                    region.id
                )));
            }
        }
        Ok(())
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn widget(&self, id: WidgetId) -> Option<(&Region, &Widget)> {
        self.regions
            .iter()
            .find_map(|r| r.widgets.iter().find(|w| w.id == id).map(|w| (r, w)))
    }

    pub fn widget_mut(&mut self, id: WidgetId) -> Option<&mut Widget> {
        self.regions
            .iter_mut()
            .find_map(|r| r.widgets.iter_mut().find(|w| w.id == id))
    }
}

/// Collection-shaped summary of a layout, as returned by the layout listing.
/// Carries just enough for the draft search.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LayoutSummary {
    pub id: LayoutId,
    pub publish_state: PublishState,
    #[serde(default)]
    pub parent_id: Option<LayoutId>,
}

/// A media item attached to a widget or listed by a sub-playlist.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MediaRef {
    pub media_id: MediaId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DatasetColumn {
    pub column_id: u64,
    pub heading: String,
}

/// One dataset row, keyed by column heading.
pub type DatasetRow = serde_json::Map<String, serde_json::Value>;
