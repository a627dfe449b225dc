#![forbid(unsafe_code)]

pub mod client;
pub mod error;
pub mod model;
pub mod mutate;
pub mod options;
pub mod resolve;
pub mod scene;
pub mod session;

pub use client::{
    CheckoutReceipt, CmsClient, CollectionKind, CollectionPage, CollectionQuery,
    WidgetUpdatePayload,
};
pub use error::{VitrineError, VitrineResult};
pub use model::{
    DatasetColumn, DatasetId, DatasetRow, LayoutDocument, LayoutId, LayoutSummary, MediaId,
    MediaRef, ModuleKind, OptionPair, PlaylistId, PublishState, Rect, Region, RegionId, Widget,
    WidgetId,
};
pub use mutate::{apply_media_swap, apply_text_edit};
pub use options::{
    CanvasElement, CanvasElementKind, DatasetRef, DecodedOptions, SubPlaylistRef, decode,
};
pub use resolve::{ResolvedSubResource, SubResourceCache, SubResourceKey, ViewToken};
pub use scene::{
    RenderStrategy, Scene, SceneConfig, SceneContent, SceneNode, Viewport, build_scene,
};
pub use session::{EditSession, EditSessionState};
