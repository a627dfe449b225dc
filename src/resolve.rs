//! Per-view sub-resource cache with request coalescing.
//!
//! Widgets reference sub-playlists and datasets by id; several widgets in one
//! layout frequently reference the same id. The cache memoizes each
//! `(kind, id)` key for the lifetime of the current layout view and shares a
//! single in-flight fetch between concurrent resolvers. Navigating to another
//! layout bumps a generation counter; results belonging to a previous view are
//! discarded on arrival instead of leaking into the new one.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::client::{CmsClient, CollectionKind, CollectionPage, CollectionQuery};
use crate::model::{DatasetColumn, DatasetId, DatasetRow, LayoutId, MediaRef, PlaylistId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum SubResourceKey {
    Playlist(PlaylistId),
    Dataset(DatasetId),
}

impl std::fmt::Display for SubResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Playlist(id) => write!(f, "playlist/{id}"),
            Self::Dataset(id) => write!(f, "dataset/{id}"),
        }
    }
}

/// Cache entry value. `Unresolved` is a first-class outcome, not an error: the
/// scene renders a placeholder for it and a retry happens only on explicit
/// refresh, never in a tight loop.
#[derive(Clone, Debug, serde::Serialize)]
pub enum ResolvedSubResource {
    PlaylistMedia {
        items: Vec<MediaRef>,
    },
    DatasetTable {
        columns: Vec<DatasetColumn>,
        rows: Vec<DatasetRow>,
    },
    Unresolved {
        reason: String,
    },
}

impl ResolvedSubResource {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved { .. })
    }
}

/// Handle tying resolution work to one layout view. Tokens from a superseded
/// view still compare structurally but no longer match the cache generation,
/// so anything they resolve is discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewToken {
    layout_id: LayoutId,
    generation: u64,
}

impl ViewToken {
    pub fn layout_id(&self) -> LayoutId {
        self.layout_id
    }
}

type Cell = Arc<OnceCell<ResolvedSubResource>>;

#[derive(Default)]
struct CacheInner {
    generation: u64,
    entries: HashMap<SubResourceKey, Cell>,
}

/// Session-scoped cache. Pass it into the consumers explicitly; it is never
/// global, so multiple layout sessions can coexist without cross-talk.
#[derive(Default)]
pub struct SubResourceCache {
    inner: Mutex<CacheInner>,
}

impl SubResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts resolving for a (new) layout view. Invalidates everything cached
    /// for the previous view and stales all previously issued tokens.
    pub async fn begin_view(&self, layout_id: LayoutId) -> ViewToken {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.entries.clear();
        debug!(%layout_id, generation = inner.generation, "begin layout view");
        ViewToken {
            layout_id,
            generation: inner.generation,
        }
    }

    /// Resolves one sub-resource, memoized per key for the current view.
    /// Concurrent calls for the same key share a single upstream fetch.
    #[tracing::instrument(skip(self, client))]
    pub async fn resolve<C: CmsClient>(
        &self,
        token: ViewToken,
        client: &C,
        key: SubResourceKey,
    ) -> ResolvedSubResource {
        let cell = {
            let mut inner = self.inner.lock().await;
            if inner.generation != token.generation {
                debug!(%key, "resolve called with stale view token");
                return stale();
            }
            Arc::clone(inner.entries.entry(key).or_default())
        };

        let value = cell
            .get_or_init(|| fetch_sub_resource(client, key))
            .await
            .clone();

        // A navigation may have superseded this view while the fetch was in
        // flight; the late result must not be committed to the new view.
        let inner = self.inner.lock().await;
        if inner.generation != token.generation {
            warn!(%key, "sub-resource arrived after navigation; discarding");
            return stale();
        }
        value
    }

    /// Drops one cached entry so the next resolve re-fetches. Called by the
    /// mutation controller after a successful widget update.
    pub async fn invalidate(&self, token: ViewToken, key: SubResourceKey) {
        let mut inner = self.inner.lock().await;
        if inner.generation != token.generation {
            return;
        }
        if inner.entries.remove(&key).is_some() {
            debug!(%key, "sub-resource invalidated");
        }
    }

    /// Explicit user-refresh entry point; same mechanics as `invalidate`.
    pub async fn refresh(&self, token: ViewToken, key: SubResourceKey) {
        self.invalidate(token, key).await;
    }

    /// Returns the cached value for a key without fetching.
    pub async fn cached(&self, token: ViewToken, key: SubResourceKey) -> Option<ResolvedSubResource> {
        let inner = self.inner.lock().await;
        if inner.generation != token.generation {
            return None;
        }
        inner.entries.get(&key).and_then(|c| c.get().cloned())
    }
}

fn stale() -> ResolvedSubResource {
    ResolvedSubResource::Unresolved {
        reason: "view superseded by navigation".to_string(),
    }
}

async fn fetch_sub_resource<C: CmsClient>(client: &C, key: SubResourceKey) -> ResolvedSubResource {
    let (kind, query) = match key {
        SubResourceKey::Playlist(id) => (CollectionKind::PlaylistMedia, CollectionQuery::by_id(id.0)),
        SubResourceKey::Dataset(id) => (CollectionKind::DatasetData, CollectionQuery::by_id(id.0)),
    };

    match (key, client.fetch_collection(kind, &query).await) {
        (SubResourceKey::Playlist(_), Ok(CollectionPage::Media { items, .. })) => {
            ResolvedSubResource::PlaylistMedia { items }
        }
        (SubResourceKey::Dataset(_), Ok(CollectionPage::Dataset { columns, rows, .. })) => {
            ResolvedSubResource::DatasetTable { columns, rows }
        }
        (_, Ok(_)) => {
            warn!(%key, "upstream returned a mismatched collection shape");
            ResolvedSubResource::Unresolved {
                reason: "mismatched collection shape".to_string(),
            }
        }
        (_, Err(e)) => {
            warn!(%key, error = %e, "sub-resource fetch failed");
            ResolvedSubResource::Unresolved {
                reason: e.to_string(),
            }
        }
    }
}
