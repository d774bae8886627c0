//! Orchestrates user actions: identity/ownership/content checks, then one
//! [`ForumApi`] call, then the store is updated from the response.
//!
//! Instead of one page-wide busy flag, each `(post, operation)` pair is
//! tracked separately: a second identical request fails fast with
//! [`ForumError::Pending`] while unrelated posts stay interactive. The
//! in-flight entry is released by a drop guard on every exit path.
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::client::api::ForumApi;
use crate::client::error::{ForumError, ForumResult};
use crate::client::identity::IdentityContext;
use crate::client::sorting::SortCriterion;
use crate::client::store::ForumStore;
use crate::domain::{Post, Principal, ReplyRef, validate_post_content, validate_reply_content};
use crate::services::policy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Refresh,
    Create,
    Edit,
    Delete,
    Vote,
    Reply,
    DeleteReply,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Refresh => "refresh",
            Operation::Create => "create post",
            Operation::Edit => "edit post",
            Operation::Delete => "delete post",
            Operation::Vote => "vote",
            Operation::Reply => "add reply",
            Operation::DeleteReply => "delete reply",
        };
        f.write_str(name)
    }
}

/// Editing affordance of one post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Viewing,
    Editing { draft: String },
}

/// Reply composer of one post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReplyPanel {
    #[default]
    Closed,
    Composing { draft: String },
}

/// A dismissable failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub message: String,
}

// None = page-level (refresh / create)
type InFlightKey = (Option<String>, Operation);

#[derive(Debug, Default)]
struct PageState {
    store: ForumStore,
    edits: HashMap<String, EditState>,
    reply_panels: HashMap<String, ReplyPanel>,
    notices: Vec<Notice>,
    next_notice_id: u64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // state stays usable even if a holder panicked
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct InFlight<'a> {
    set: &'a Mutex<HashSet<InFlightKey>>,
    key: InFlightKey,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.set).remove(&self.key);
    }
}

pub struct ForumController<A> {
    api: A,
    // read once per action, so a request and its guard agree on the caller
    identity: Mutex<IdentityContext>,
    page: Mutex<PageState>,
    in_flight: Mutex<HashSet<InFlightKey>>,
}

impl<A: ForumApi> ForumController<A> {
    pub fn new(api: A, identity: IdentityContext, default_sort: SortCriterion) -> Self {
        Self {
            api,
            identity: Mutex::new(identity),
            page: Mutex::new(PageState {
                store: ForumStore::new(default_sort),
                ..PageState::default()
            }),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn identity(&self) -> IdentityContext {
        lock(&self.identity).clone()
    }

    /// Called when the identity provider reports a change. Requests already
    /// in flight keep the principal they were issued with.
    pub fn set_identity(&self, identity: IdentityContext) {
        *lock(&self.identity) = identity;
    }

    /// Posts in display order.
    pub fn posts(&self) -> Vec<Post> {
        lock(&self.page).store.view()
    }

    pub fn sort_criterion(&self) -> SortCriterion {
        lock(&self.page).store.criterion()
    }

    /// Full re-sort of the cached posts; no request is made.
    pub fn set_sort(&self, criterion: SortCriterion) {
        lock(&self.page).store.set_criterion(criterion);
    }

    pub fn edit_state(&self, post_id: &str) -> EditState {
        lock(&self.page)
            .edits
            .get(post_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn reply_panel(&self, post_id: &str) -> ReplyPanel {
        lock(&self.page)
            .reply_panels
            .get(post_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.page).notices.clone()
    }

    pub fn dismiss_notice(&self, id: u64) -> bool {
        let mut page = lock(&self.page);
        let before = page.notices.len();
        page.notices.retain(|n| n.id != id);
        page.notices.len() != before
    }

    /// Whether `operation` on `post_id` is outstanding. `None` asks about the
    /// page-level operations (refresh, create).
    pub fn is_pending(&self, post_id: Option<&str>, operation: Operation) -> bool {
        lock(&self.in_flight).contains(&(post_id.map(str::to_string), operation))
    }

    /// Whether edit/delete affordances should be offered for an entity.
    /// Always false until the identity provider has settled.
    pub fn can_mutate(&self, entity_author_id: &str) -> bool {
        let identity = lock(&self.identity);
        !identity.is_loading() && policy::can_mutate(identity.principal(), entity_author_id)
    }

    /// viewing → editing, seeded with the current content.
    pub fn begin_edit(&self, post_id: &str) -> ForumResult<()> {
        let post = self.cached(post_id)?;
        self.ensure_can_mutate(&post.author_id)?;
        lock(&self.page).edits.insert(
            post_id.to_string(),
            EditState::Editing {
                draft: post.content,
            },
        );
        Ok(())
    }

    pub fn set_edit_draft(&self, post_id: &str, draft: impl Into<String>) {
        if let Some(EditState::Editing { draft: current }) = lock(&self.page).edits.get_mut(post_id)
        {
            *current = draft.into();
        }
    }

    /// editing → viewing, draft discarded.
    pub fn cancel_edit(&self, post_id: &str) {
        lock(&self.page).edits.remove(post_id);
    }

    /// closed ↔ composing. Closing discards the draft.
    pub fn toggle_reply(&self, post_id: &str) {
        let mut page = lock(&self.page);
        if page.reply_panels.remove(post_id).is_none() {
            page.reply_panels.insert(
                post_id.to_string(),
                ReplyPanel::Composing {
                    draft: String::new(),
                },
            );
        }
    }

    pub fn set_reply_draft(&self, post_id: &str, draft: impl Into<String>) {
        if let Some(ReplyPanel::Composing { draft: current }) =
            lock(&self.page).reply_panels.get_mut(post_id)
        {
            *current = draft.into();
        }
    }

    /// Fetches all posts. On failure the list is emptied so the empty state
    /// shows instead of stale data.
    pub async fn refresh(&self) -> ForumResult<()> {
        self.ready()?;
        let _in_flight = self.begin(None, Operation::Refresh)?;

        match self.api.list_posts().await {
            Ok(posts) => {
                tracing::debug!(count = posts.len(), "discussions fetched");
                let mut page = lock(&self.page);
                page.store.replace_all(posts);
                let PageState {
                    store,
                    edits,
                    reply_panels,
                    ..
                } = &mut *page;
                edits.retain(|id, _| store.get(id).is_some());
                reply_panels.retain(|id, _| store.get(id).is_some());
                Ok(())
            }
            Err(err) => {
                lock(&self.page).store.clear();
                Err(self.report(Operation::Refresh, err))
            }
        }
    }

    pub async fn create_post(&self, content: &str) -> ForumResult<Post> {
        let principal = self.principal()?;
        validate_post_content(content)?;
        let _in_flight = self.begin(None, Operation::Create)?;

        match self.api.create_post(content, &principal).await {
            Ok(post) => {
                lock(&self.page).store.upsert(post.clone());
                Ok(post)
            }
            Err(err) => Err(self.report(Operation::Create, err)),
        }
    }

    /// Sends the edit draft. The post stays in editing state on failure.
    pub async fn save_edit(&self, post_id: &str) -> ForumResult<Post> {
        let caller = self.owned_post(post_id)?;
        let draft = match self.edit_state(post_id) {
            EditState::Editing { draft } => draft,
            EditState::Viewing => {
                return Err(ForumError::Validation("post is not being edited".into()));
            }
        };
        validate_post_content(&draft)?;
        let _in_flight = self.begin(Some(post_id), Operation::Edit)?;

        match self.api.edit_post(post_id, &draft, &caller).await {
            Ok(post) => {
                let mut page = lock(&self.page);
                page.store.replace(post.clone());
                page.edits.remove(post_id);
                Ok(post)
            }
            Err(err) => Err(self.report(Operation::Edit, err)),
        }
    }

    pub async fn delete_post(&self, post_id: &str) -> ForumResult<()> {
        let caller = self.owned_post(post_id)?;
        let _in_flight = self.begin(Some(post_id), Operation::Delete)?;

        match self.api.delete_post(post_id, &caller).await {
            Ok(()) => {
                let mut page = lock(&self.page);
                page.store.remove(post_id);
                page.edits.remove(post_id);
                page.reply_panels.remove(post_id);
                Ok(())
            }
            Err(err) => Err(self.report(Operation::Delete, err)),
        }
    }

    pub async fn vote(&self, post_id: &str) -> ForumResult<Post> {
        let caller = self.principal()?;
        self.cached(post_id)?;
        let _in_flight = self.begin(Some(post_id), Operation::Vote)?;

        match self.api.vote_post(post_id, &caller).await {
            Ok(post) => {
                lock(&self.page).store.replace(post.clone());
                Ok(post)
            }
            Err(err) => Err(self.report(Operation::Vote, err)),
        }
    }

    /// Sends the reply draft; the panel closes on success.
    pub async fn submit_reply(&self, post_id: &str) -> ForumResult<Post> {
        let principal = self.principal()?;
        self.cached(post_id)?;
        let draft = match self.reply_panel(post_id) {
            ReplyPanel::Composing { draft } => draft,
            ReplyPanel::Closed => {
                return Err(ForumError::Validation("reply panel is closed".into()));
            }
        };
        validate_reply_content(&draft)?;
        let _in_flight = self.begin(Some(post_id), Operation::Reply)?;

        match self.api.add_reply(post_id, &draft, &principal).await {
            Ok(post) => {
                let mut page = lock(&self.page);
                page.store.replace(post.clone());
                page.reply_panels.remove(post_id);
                Ok(post)
            }
            Err(err) => Err(self.report(Operation::Reply, err)),
        }
    }

    /// Deletes a reply by its stable id.
    pub async fn delete_reply(&self, post_id: &str, reply_id: Uuid) -> ForumResult<Post> {
        let post = self.cached(post_id)?;
        let reply = post
            .reply(reply_id)
            .ok_or_else(|| ForumError::NotFound(format!("reply {reply_id}")))?;
        let caller = self.ensure_can_mutate(&reply.author_id)?;

        self.send_delete_reply(post_id, reply_id, &caller).await
    }

    /// Deletes the reply shown at `index`. The position is resolved against
    /// the cached post and sent as the reply's id, so a concurrent removal
    /// cannot shift it onto another reply.
    pub async fn delete_reply_at(&self, post_id: &str, index: i64) -> ForumResult<Post> {
        let post = self.cached(post_id)?;
        let len = post.replies.len();
        let reply = usize::try_from(index)
            .ok()
            .and_then(|i| post.replies.get(i))
            .ok_or_else(|| {
                ForumError::OutOfRange(format!("reply index {index} with {len} replies"))
            })?;
        let caller = self.ensure_can_mutate(&reply.author_id)?;

        self.send_delete_reply(post_id, reply.id, &caller).await
    }

    async fn send_delete_reply(
        &self,
        post_id: &str,
        reply_id: Uuid,
        caller: &Principal,
    ) -> ForumResult<Post> {
        let _in_flight = self.begin(Some(post_id), Operation::DeleteReply)?;

        match self
            .api
            .delete_reply(post_id, ReplyRef::Id(reply_id), caller)
            .await
        {
            Ok(post) => {
                lock(&self.page).store.replace(post.clone());
                Ok(post)
            }
            Err(err) => Err(self.report(Operation::DeleteReply, err)),
        }
    }

    fn ready(&self) -> ForumResult<()> {
        if lock(&self.identity).is_loading() {
            return Err(ForumError::AuthLoading);
        }
        Ok(())
    }

    fn principal(&self) -> ForumResult<Principal> {
        let identity = lock(&self.identity);
        if identity.is_loading() {
            return Err(ForumError::AuthLoading);
        }
        identity
            .principal()
            .cloned()
            .ok_or_else(|| ForumError::Authorization("sign in required".into()))
    }

    fn ensure_can_mutate(&self, author_id: &str) -> ForumResult<Principal> {
        let caller = self.principal()?;
        if !policy::can_mutate(Some(&caller), author_id) {
            return Err(ForumError::Authorization("only the author may do this".into()));
        }
        Ok(caller)
    }

    fn cached(&self, post_id: &str) -> ForumResult<Post> {
        lock(&self.page)
            .store
            .get(post_id)
            .cloned()
            .ok_or_else(|| ForumError::NotFound(format!("discussion {post_id}")))
    }

    fn owned_post(&self, post_id: &str) -> ForumResult<Principal> {
        let post = self.cached(post_id)?;
        self.ensure_can_mutate(&post.author_id)
    }

    fn begin(&self, post_id: Option<&str>, operation: Operation) -> ForumResult<InFlight<'_>> {
        let key = (post_id.map(str::to_string), operation);
        if !lock(&self.in_flight).insert(key.clone()) {
            return Err(ForumError::Pending(operation.to_string()));
        }
        Ok(InFlight {
            set: &self.in_flight,
            key,
        })
    }

    // Logs a failed request and surfaces it as a notice. No retry.
    fn report(&self, operation: Operation, err: ForumError) -> ForumError {
        tracing::warn!(%operation, error = %err, "forum request failed");

        let mut page = lock(&self.page);
        page.next_notice_id += 1;
        let id = page.next_notice_id;
        page.notices.push(Notice {
            id,
            message: format!("Could not {operation}: {err}"),
        });
        err
    }
}
