//! Debounced draft autosave.
//!
//! One pending write per post: every queued edit replaces the pending draft
//! and resets the timer; when the timer fires, the latest draft is written
//! once. An explicit publish cancels the timer and takes the pending draft
//! so the publish handler can fold it into its own immediate write. This
//! removes the lost-update window of two independent timers racing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::content::blog::{BlogPostDraft, BlogStore};

struct PendingSave {
    handle: tokio::task::JoinHandle<()>,
    draft: Arc<Mutex<BlogPostDraft>>,
}

/// Debounced writer for in-progress drafts.
pub struct Autosaver {
    store: Arc<dyn BlogStore>,
    delay: Duration,
    pending: Arc<Mutex<HashMap<String, PendingSave>>>,
}

impl Autosaver {
    #[must_use]
    pub fn new(store: Arc<dyn BlogStore>, delay: Duration) -> Self {
        Self {
            store,
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Queue a draft write for `post_id`, resetting the pending timer.
    pub fn queue(&self, post_id: &str, draft: BlogPostDraft) {
        let slot = {
            let mut pending = self.pending.lock().unwrap();
            if let Some(existing) = pending.remove(post_id) {
                existing.handle.abort();
                *existing.draft.lock().unwrap() = draft;
                existing.draft
            } else {
                Arc::new(Mutex::new(draft))
            }
        };

        let handle = tokio::spawn({
            let store = Arc::clone(&self.store);
            let map = Arc::clone(&self.pending);
            let slot = Arc::clone(&slot);
            let post_id = post_id.to_string();
            let delay = self.delay;
            async move {
                tokio::time::sleep(delay).await;
                map.lock().unwrap().remove(&post_id);
                let draft = slot.lock().unwrap().clone();
                if let Err(err) = store.update_post(&post_id, &draft).await {
                    tracing::warn!(post_id = %post_id, error = %err, "draft autosave failed");
                }
            }
        });

        self.pending
            .lock()
            .unwrap()
            .insert(post_id.to_string(), PendingSave { handle, draft: slot });
    }

    /// Cancel any pending write for `post_id`, returning the unwritten
    /// draft so the caller can apply it synchronously.
    pub fn cancel(&self, post_id: &str) -> Option<BlogPostDraft> {
        let entry = self.pending.lock().unwrap().remove(post_id)?;
        entry.handle.abort();
        let draft = entry.draft.lock().unwrap().clone();
        Some(draft)
    }
}
