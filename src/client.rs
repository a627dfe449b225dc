//! Boundary to the external auth/proxy layer in front of the upstream CMS.
//!
//! Everything behind this trait is someone else's problem: authentication,
//! pagination, deduplication and owner filtering all happen upstream of the
//! engine. Collections arrive already filtered to the current user.

use crate::error::VitrineResult;
use crate::model::{
    DatasetColumn, DatasetRow, LayoutDocument, LayoutId, LayoutSummary, MediaId, MediaRef,
    OptionPair, PublishState, WidgetId,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionKind {
    Layouts,
    PlaylistMedia,
    DatasetData,
}

/// Query passed through to the upstream collection fetcher. Unused fields stay
/// `None`; the fetcher ignores what it does not understand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectionQuery {
    /// Playlist or dataset id for the sub-resource kinds.
    pub id: Option<u64>,
    /// Restrict the layout listing to drafts of this parent.
    pub parent_id: Option<LayoutId>,
    pub publish_state: Option<PublishState>,
}

impl CollectionQuery {
    pub fn by_id(id: u64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn drafts_of(parent: LayoutId) -> Self {
        Self {
            parent_id: Some(parent),
            publish_state: Some(PublishState::Draft),
            ..Self::default()
        }
    }
}

/// One page of an upstream collection, already paginated and deduplicated.
#[derive(Clone, Debug, serde::Serialize)]
pub enum CollectionPage {
    Layouts {
        items: Vec<LayoutSummary>,
        total: u64,
    },
    Media {
        items: Vec<MediaRef>,
        total: u64,
    },
    Dataset {
        columns: Vec<DatasetColumn>,
        rows: Vec<DatasetRow>,
        total: u64,
    },
}

/// Receipt returned by a successful checkout.
#[derive(Clone, Copy, Debug, serde::Deserialize)]
pub struct CheckoutReceipt {
    pub draft_id: LayoutId,
}

/// Full widget update submitted back to the CMS. Upstream does not support
/// partial updates: the whole option structure is round-tripped verbatim with
/// only the edited value changed.
#[derive(Clone, Debug, serde::Serialize)]
pub struct WidgetUpdatePayload {
    pub options: Vec<OptionPair>,
    pub media_ids: Vec<MediaId>,
}

/// The upstream CMS surface this engine consumes. All methods run on the one
/// cooperative scheduler; implementations map transport and HTTP failures to
/// `VitrineError::Upstream` (or `CheckoutConflict` where the CMS reports an
/// existing checkout).
#[allow(async_fn_in_trait)]
pub trait CmsClient {
    async fn fetch_layout(&self, id: LayoutId) -> VitrineResult<LayoutDocument>;

    async fn fetch_collection(
        &self,
        kind: CollectionKind,
        query: &CollectionQuery,
    ) -> VitrineResult<CollectionPage>;

    async fn checkout(&self, id: LayoutId) -> VitrineResult<CheckoutReceipt>;

    async fn publish(&self, id: LayoutId) -> VitrineResult<()>;

    async fn submit_widget_update(
        &self,
        widget_id: WidgetId,
        payload: &WidgetUpdatePayload,
    ) -> VitrineResult<()>;
}
