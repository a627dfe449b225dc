//! Checkout/draft/publish state machine for one layout edit session.
//!
//! The upstream CMS has no idempotent checkout: opening a published layout for
//! editing creates a draft copy, and a second checkout attempt reports a
//! conflict instead of returning the existing draft. The conflict recovery
//! here (search the layouts whose parent is the published id) is a bounded,
//! best-effort path, not a guaranteed reconciliation.

use tracing::{info, warn};

use crate::client::{CmsClient, CollectionKind, CollectionPage, CollectionQuery};
use crate::error::{VitrineError, VitrineResult};
use crate::model::{LayoutDocument, LayoutId, PublishState};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum EditSessionState {
    ViewingPublished {
        layout_id: LayoutId,
    },
    CheckingOut {
        layout_id: LayoutId,
    },
    ViewingDraft {
        layout_id: LayoutId,
        /// Parent published layout this draft was checked out from, when
        /// known. Publishing collapses back to this id.
        draft_of: Option<LayoutId>,
    },
    CheckoutFailed {
        layout_id: LayoutId,
        reason: String,
    },
}

impl EditSessionState {
    /// The layout id whose document is (or was last) displayed. The address
    /// context must always match this id.
    pub fn active_layout_id(&self) -> LayoutId {
        match self {
            Self::ViewingPublished { layout_id }
            | Self::CheckingOut { layout_id }
            | Self::ViewingDraft { layout_id, .. }
            | Self::CheckoutFailed { layout_id, .. } => *layout_id,
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, Self::ViewingDraft { .. })
    }
}

pub struct EditSession {
    state: EditSessionState,
}

impl EditSession {
    /// Initial state is determined by the fetched document's publish state.
    pub fn from_document(doc: &LayoutDocument) -> Self {
        let state = match doc.publish_state {
            PublishState::Published => EditSessionState::ViewingPublished { layout_id: doc.id },
            PublishState::Draft => EditSessionState::ViewingDraft {
                layout_id: doc.id,
                draft_of: doc.parent_id,
            },
        };
        Self { state }
    }

    /// Fetches a layout and opens a session on it.
    pub async fn open<C: CmsClient>(
        client: &C,
        id: LayoutId,
    ) -> VitrineResult<(Self, LayoutDocument)> {
        let doc = client.fetch_layout(id).await?;
        Ok((Self::from_document(&doc), doc))
    }

    pub fn state(&self) -> &EditSessionState {
        &self.state
    }

    /// Drives the auto-checkout transition. Returns the layout id the caller
    /// must navigate to — a redirect, never an in-place mutation, so the id in
    /// the address context always matches the displayed document.
    ///
    /// Opening an already-Draft layout is a no-op returning the current id;
    /// no checkout call is issued.
    #[tracing::instrument(skip(self, client))]
    pub async fn open_for_edit<C: CmsClient>(&mut self, client: &C) -> VitrineResult<LayoutId> {
        let layout_id = match &self.state {
            EditSessionState::ViewingDraft { layout_id, .. } => return Ok(*layout_id),
            EditSessionState::CheckingOut { .. } => {
                return Err(VitrineError::validation("checkout already in progress"));
            }
            // A previous failure does not block an explicit new attempt.
            EditSessionState::ViewingPublished { layout_id }
            | EditSessionState::CheckoutFailed { layout_id, .. } => *layout_id,
        };

        self.state = EditSessionState::CheckingOut { layout_id };

        match client.checkout(layout_id).await {
            Ok(receipt) => {
                info!(%layout_id, draft_id = %receipt.draft_id, "checked out draft");
                self.state = EditSessionState::ViewingDraft {
                    layout_id: receipt.draft_id,
                    draft_of: Some(layout_id),
                };
                Ok(receipt.draft_id)
            }
            Err(e) if e.is_checkout_conflict() => {
                info!(%layout_id, "layout already checked out; searching for existing draft");
                self.recover_existing_draft(client, layout_id).await
            }
            Err(e) => {
                let reason = e.to_string();
                self.state = EditSessionState::CheckoutFailed {
                    layout_id,
                    reason: reason.clone(),
                };
                Err(VitrineError::checkout_failed(reason))
            }
        }
    }

    /// Single bounded search pass over drafts of the published id. No retry
    /// loop: if nothing is found the failure surfaces to the user.
    async fn recover_existing_draft<C: CmsClient>(
        &mut self,
        client: &C,
        parent: LayoutId,
    ) -> VitrineResult<LayoutId> {
        let page = client
            .fetch_collection(CollectionKind::Layouts, &CollectionQuery::drafts_of(parent))
            .await;

        let candidates: Vec<LayoutId> = match page {
            Ok(CollectionPage::Layouts { items, .. }) => items
                .iter()
                .filter(|l| {
                    l.publish_state == PublishState::Draft && l.parent_id == Some(parent)
                })
                .map(|l| l.id)
                .collect(),
            Ok(_) => {
                return self.fail_checkout(parent, "layout search returned a mismatched shape");
            }
            Err(e) => {
                return self.fail_checkout(parent, format!("layout search failed: {e}"));
            }
        };

        match candidates.as_slice() {
            [] => self.fail_checkout(parent, "no existing draft found for checked-out layout"),
            [only] => {
                info!(%parent, draft_id = %only, "recovered existing draft");
                self.state = EditSessionState::ViewingDraft {
                    layout_id: *only,
                    draft_of: Some(parent),
                };
                Ok(*only)
            }
            [first, ..] => {
                // Upstream does not guarantee exactly one draft per parent.
                // Taking the first match is ambiguous, so it is flagged.
                warn!(
                    %parent,
                    candidates = ?candidates,
                    chosen = %first,
                    "multiple drafts found for parent; taking the first"
                );
                self.state = EditSessionState::ViewingDraft {
                    layout_id: *first,
                    draft_of: Some(parent),
                };
                Ok(*first)
            }
        }
    }

    fn fail_checkout(
        &mut self,
        layout_id: LayoutId,
        reason: impl Into<String>,
    ) -> VitrineResult<LayoutId> {
        let reason = reason.into();
        self.state = EditSessionState::CheckoutFailed {
            layout_id,
            reason: reason.clone(),
        };
        Err(VitrineError::checkout_failed(reason))
    }

    /// Publishes the current draft and collapses the session back to the
    /// parent id. Returns the id to navigate to.
    pub async fn publish<C: CmsClient>(&mut self, client: &C) -> VitrineResult<LayoutId> {
        let (layout_id, draft_of) = match &self.state {
            EditSessionState::ViewingDraft {
                layout_id,
                draft_of,
            } => (*layout_id, *draft_of),
            other => {
                return Err(VitrineError::validation(format!(
                    "only a draft can be published (state: {other:?})"
                )));
            }
        };

        client.publish(layout_id).await?;
        let target = draft_of.unwrap_or(layout_id);
        info!(draft_id = %layout_id, published_id = %target, "published draft");
        self.state = EditSessionState::ViewingPublished { layout_id: target };
        Ok(target)
    }
}
