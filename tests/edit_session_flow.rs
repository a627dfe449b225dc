use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use vitrine::{
    CheckoutReceipt, CmsClient, CollectionKind, CollectionPage, CollectionQuery, EditSession,
    EditSessionState, LayoutDocument, LayoutId, LayoutSummary, PublishState, VitrineError,
    VitrineResult, WidgetId,
};

/// Captures the session transition logs in test output. Safe to call from
/// every test; only the first init wins.
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Small in-memory CMS: a map of layout documents plus scripted checkout
/// behavior, enough to drive the whole open → edit → publish flow.
struct FakeCms {
    layouts: Mutex<BTreeMap<u64, LayoutDocument>>,
    checkout_calls: AtomicUsize,
    conflict_on_checkout: bool,
}

impl FakeCms {
    fn new(docs: Vec<LayoutDocument>, conflict_on_checkout: bool) -> Self {
        let layouts = docs.into_iter().map(|d| (d.id.0, d)).collect();
        Self {
            layouts: Mutex::new(layouts),
            checkout_calls: AtomicUsize::new(0),
            conflict_on_checkout,
        }
    }
}

impl CmsClient for FakeCms {
    async fn fetch_layout(&self, id: LayoutId) -> VitrineResult<LayoutDocument> {
        self.layouts
            .lock()
            .unwrap()
            .get(&id.0)
            .cloned()
            .ok_or_else(|| VitrineError::upstream(format!("layout {id} not found")))
    }

    async fn fetch_collection(
        &self,
        kind: CollectionKind,
        query: &CollectionQuery,
    ) -> VitrineResult<CollectionPage> {
        assert_eq!(kind, CollectionKind::Layouts);
        let items: Vec<LayoutSummary> = self
            .layouts
            .lock()
            .unwrap()
            .values()
            .filter(|l| query.parent_id.is_none() || l.parent_id == query.parent_id)
            .filter(|l| {
                query
                    .publish_state
                    .is_none_or(|s| l.publish_state == s)
            })
            .map(|l| LayoutSummary {
                id: l.id,
                publish_state: l.publish_state,
                parent_id: l.parent_id,
            })
            .collect();
        let total = items.len() as u64;
        Ok(CollectionPage::Layouts { items, total })
    }

    async fn checkout(&self, id: LayoutId) -> VitrineResult<CheckoutReceipt> {
        self.checkout_calls.fetch_add(1, Ordering::SeqCst);
        if self.conflict_on_checkout {
            return Err(VitrineError::checkout_conflict(format!(
                "layout {id} is already checked out"
            )));
        }

        let mut layouts = self.layouts.lock().unwrap();
        let Some(parent) = layouts.get(&id.0).cloned() else {
            return Err(VitrineError::upstream(format!("layout {id} not found")));
        };
        let draft_id = LayoutId(id.0 + 139);
        let mut draft = parent;
        draft.id = draft_id;
        draft.publish_state = PublishState::Draft;
        draft.parent_id = Some(id);
        layouts.insert(draft_id.0, draft);
        Ok(CheckoutReceipt { draft_id })
    }

    async fn publish(&self, id: LayoutId) -> VitrineResult<()> {
        let mut layouts = self.layouts.lock().unwrap();
        let Some(draft) = layouts.remove(&id.0) else {
            return Err(VitrineError::upstream(format!("layout {id} not found")));
        };
        if let Some(parent_id) = draft.parent_id {
            let mut published = draft;
            published.id = parent_id;
            published.publish_state = PublishState::Published;
            published.parent_id = None;
            layouts.insert(parent_id.0, published);
        }
        Ok(())
    }

    async fn submit_widget_update(
        &self,
        _widget_id: WidgetId,
        _payload: &vitrine::WidgetUpdatePayload,
    ) -> VitrineResult<()> {
        Ok(())
    }
}

fn published(id: u64) -> LayoutDocument {
    LayoutDocument {
        id: LayoutId(id),
        width: 1280.0,
        height: 720.0,
        background_ref: None,
        duration_seconds: 30.0,
        publish_state: PublishState::Published,
        parent_id: None,
        regions: vec![],
    }
}

fn draft(id: u64, parent: u64) -> LayoutDocument {
    let mut doc = published(id);
    doc.publish_state = PublishState::Draft;
    doc.parent_id = Some(LayoutId(parent));
    doc
}

#[tokio::test]
async fn open_edit_publish_round_trip() {
    // End to end: open published 761, checkout creates 900, the session
    // redirects there, and publishing collapses back to 761.
    init_tracing();
    let cms = FakeCms::new(vec![published(761)], false);

    let (mut session, doc) = EditSession::open(&cms, LayoutId(761)).await.unwrap();
    assert_eq!(doc.publish_state, PublishState::Published);
    assert_eq!(
        *session.state(),
        EditSessionState::ViewingPublished {
            layout_id: LayoutId(761)
        }
    );

    let draft_id = session.open_for_edit(&cms).await.unwrap();
    assert_eq!(draft_id, LayoutId(900));

    // The redirect lands on a real, fetchable draft document.
    let draft_doc = cms.fetch_layout(draft_id).await.unwrap();
    assert_eq!(draft_doc.publish_state, PublishState::Draft);
    assert_eq!(draft_doc.parent_id, Some(LayoutId(761)));

    let back = session.publish(&cms).await.unwrap();
    assert_eq!(back, LayoutId(761));
    assert_eq!(
        cms.fetch_layout(back).await.unwrap().publish_state,
        PublishState::Published
    );
}

#[tokio::test]
async fn conflicted_checkout_finds_existing_draft() {
    // Checkout conflicts, but draft 905 of parent 761 already exists.
    init_tracing();
    let cms = FakeCms::new(vec![published(761), draft(905, 761)], true);

    let (mut session, _) = EditSession::open(&cms, LayoutId(761)).await.unwrap();
    let target = session.open_for_edit(&cms).await.unwrap();

    assert_eq!(target, LayoutId(905));
    assert_eq!(
        *session.state(),
        EditSessionState::ViewingDraft {
            layout_id: LayoutId(905),
            draft_of: Some(LayoutId(761)),
        }
    );
}

#[tokio::test]
async fn opening_draft_is_checkout_idempotent() {
    init_tracing();
    let cms = FakeCms::new(vec![draft(905, 761)], false);

    let (mut session, _) = EditSession::open(&cms, LayoutId(905)).await.unwrap();
    let target = session.open_for_edit(&cms).await.unwrap();

    assert_eq!(target, LayoutId(905));
    assert_eq!(cms.checkout_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn conflict_with_no_draft_fails_without_retries() {
    init_tracing();
    let cms = FakeCms::new(vec![published(761)], true);

    let (mut session, _) = EditSession::open(&cms, LayoutId(761)).await.unwrap();
    let err = session.open_for_edit(&cms).await.unwrap_err();

    assert!(matches!(err, VitrineError::CheckoutFailed(_)));
    assert_eq!(cms.checkout_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        session.state().active_layout_id(),
        LayoutId(761),
        "failed session stays on the published id"
    );
}
