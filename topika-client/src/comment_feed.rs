use std::collections::HashSet;

use crate::{
    api::{
        Comment, CommentId, Error, Identity, NewComment, OrderType, PageRange, Store, Time,
        TopicId,
    },
    CommentComposer, FeedError,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentFeedConfig {
    /// Rows per fetched window
    pub page_size: u64,

    /// Show the newest comments first; fresh submissions are prepended. The
    /// oldest-first variant fetches ascending and appends instead.
    pub newest_first: bool,

    /// Apply submissions locally before the store acknowledges them
    pub optimistic: bool,

    /// Cooldown between scroll-triggered load-more rounds
    pub load_cooldown: chrono::Duration,
}

impl Default for CommentFeedConfig {
    fn default() -> CommentFeedConfig {
        CommentFeedConfig {
            page_size: 6,
            newest_first: true,
            optimistic: true,
            load_cooldown: chrono::Duration::milliseconds(500),
        }
    }
}

/// Where the feed is in its lifecycle. There is no terminal error state: a
/// failed round-trip lands back in `Ready` with a notice attached.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FeedStage {
    Idle,
    Loading,
    LoadingMore,
    Ready,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentFeedState {
    /// Loaded window, deduplicated by id, first-seen order
    pub items: Vec<Comment>,
    pub has_more: bool,
    /// Independently fetched exact count; may transiently disagree with
    /// `items.len()` and is never derived from it
    pub total_count: u64,
}

impl CommentFeedState {
    fn new() -> CommentFeedState {
        CommentFeedState {
            items: Vec::new(),
            has_more: true,
            total_count: 0,
        }
    }
}

/// Ticket for one page round-trip, settled with [`CommentFeed::apply_page`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageRequest {
    generation: u64,
    range: PageRange,
}

impl PageRequest {
    pub fn range(&self) -> PageRange {
        self.range
    }
}

/// Ticket for one create round-trip, settled with
/// [`CommentFeed::apply_insert`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingComment {
    generation: u64,
    /// Id of the locally inserted row when the optimistic variant applied one
    placeholder: Option<CommentId>,
    content: String,
    email: Option<String>,
}

impl PendingComment {
    /// Insert payload to send to the store
    pub fn to_insert(&self, topic: TopicId) -> NewComment {
        NewComment {
            topic_id: topic,
            content: self.content.clone(),
        }
    }
}

/// Ticket for one count round-trip, settled with
/// [`CommentFeed::apply_count`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CountRequest {
    generation: u64,
}

/// Fixed-cooldown suppressor for the viewport-intersection signal: however
/// often the scroll sentinel fires, at most one load-more per window
#[derive(Clone, Debug)]
pub struct LoadMoreThrottle {
    cooldown: chrono::Duration,
    last: Option<Time>,
}

impl LoadMoreThrottle {
    pub fn new(cooldown: chrono::Duration) -> LoadMoreThrottle {
        LoadMoreThrottle {
            cooldown,
            last: None,
        }
    }

    pub fn allow(&mut self, now: Time) -> bool {
        match self.last {
            Some(last) if now - last < self.cooldown => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Paginated, append-only view of one topic's comments, with optimistic
/// insertion, pessimistic deletion, and an independently tracked total.
///
/// Every mutation is split into a synchronous `begin_*` step that commits the
/// intent and an `apply_*` step that commits the store's response; the async
/// methods compose the two around the store call. The split keeps the
/// event-loop interleavings (rapid double submits, out-of-order pages, stale
/// responses after a topic switch) testable without a runtime.
pub struct CommentFeed<S> {
    store: S,
    topic: TopicId,
    config: CommentFeedConfig,
    state: CommentFeedState,
    stage: FeedStage,
    last_error: Option<FeedError>,
    throttle: LoadMoreThrottle,

    /// Bumped on reset; responses ticketed before the bump are dropped
    generation: u64,
    /// Single-flight guard for creates
    creating: bool,
    /// Placeholder ids count down from -1 so they can never collide with
    /// server-assigned keys
    placeholder_seq: i64,
}

impl<S> CommentFeed<S> {
    pub fn new(store: S, topic: TopicId, config: CommentFeedConfig) -> CommentFeed<S> {
        let throttle = LoadMoreThrottle::new(config.load_cooldown);
        CommentFeed {
            store,
            topic,
            config,
            state: CommentFeedState::new(),
            stage: FeedStage::Idle,
            last_error: None,
            throttle,
            generation: 0,
            creating: false,
            placeholder_seq: 0,
        }
    }

    pub fn topic(&self) -> TopicId {
        self.topic
    }

    pub fn state(&self) -> &CommentFeedState {
        &self.state
    }

    pub fn items(&self) -> &[Comment] {
        &self.state.items
    }

    pub fn has_more(&self) -> bool {
        self.state.has_more
    }

    pub fn total_count(&self) -> u64 {
        self.state.total_count
    }

    pub fn stage(&self) -> FeedStage {
        self.stage
    }

    pub fn order(&self) -> OrderType {
        match self.config.newest_first {
            true => OrderType::Desc,
            false => OrderType::Asc,
        }
    }

    /// Takes the pending notice, if any; the feed stays interactive either
    /// way
    pub fn take_error(&mut self) -> Option<FeedError> {
        self.last_error.take()
    }

    fn notice(&mut self, e: FeedError) {
        self.last_error = Some(e);
    }

    fn noticed(&mut self, e: FeedError) -> FeedError {
        self.notice(e.clone());
        e
    }

    /// Drops all loaded state and switches to `topic`. Responses still in
    /// flight for the previous life of the feed will be ignored when they
    /// land.
    pub fn reset(&mut self, topic: TopicId) {
        self.generation += 1;
        self.topic = topic;
        self.state = CommentFeedState::new();
        self.stage = FeedStage::Idle;
        self.last_error = None;
        self.creating = false;
    }

    /// Starts a page round-trip. The offset is read from committed state
    /// only, so two rapid triggers cannot compute the same window: the second
    /// returns `None` while the first is in flight.
    pub fn begin_load_more(&mut self) -> Option<PageRequest> {
        match self.stage {
            FeedStage::Loading | FeedStage::LoadingMore => return None,
            FeedStage::Ready if !self.state.has_more => return None,
            FeedStage::Idle => self.stage = FeedStage::Loading,
            FeedStage::Ready => self.stage = FeedStage::LoadingMore,
        }
        Some(PageRequest {
            generation: self.generation,
            range: PageRange::window(self.state.items.len() as u64, self.config.page_size),
        })
    }

    /// Scroll-sentinel entry point: checks `has_more` and the cooldown before
    /// delegating to [`Self::begin_load_more`]
    pub fn on_scroll_hit(&mut self, now: Time) -> Option<PageRequest> {
        if !self.state.has_more || !self.throttle.allow(now) {
            return None;
        }
        self.begin_load_more()
    }

    pub fn apply_page(&mut self, req: PageRequest, result: Result<Vec<Comment>, Error>) {
        if req.generation != self.generation {
            tracing::warn!(range = ?req.range, "dropping page response from a previous feed generation");
            return;
        }
        self.stage = FeedStage::Ready;
        match result {
            // prior state stays untouched; no retry
            Err(e) => self.notice(FeedError::Fetch(e)),
            Ok(rows) => {
                // full-window heuristic: a short page means the collection is
                // exhausted. When the remainder exactly fills the window this
                // reports true once too often and the next, empty page
                // settles it.
                self.state.has_more = rows.len() as u64 == req.range.len();
                self.append_rows(rows);
            }
        }
    }

    /// Concatenate then dedup by id, preserving first-seen order. Imprecise
    /// offset bookkeeping (an optimistic insert shifting the true offset) can
    /// hand us rows we already hold.
    fn append_rows(&mut self, rows: Vec<Comment>) {
        let mut seen: HashSet<CommentId> = self.state.items.iter().map(|c| c.id).collect();
        let mut dropped = 0;
        for c in rows {
            match seen.insert(c.id) {
                true => self.state.items.push(c),
                false => dropped += 1,
            }
        }
        if dropped > 0 {
            tracing::warn!(dropped, "dropped duplicate rows while appending a page");
        }
    }

    fn insert_local(&mut self, comment: Comment) {
        if self.state.items.iter().any(|c| c.id == comment.id) {
            return;
        }
        match self.config.newest_first {
            true => self.state.items.insert(0, comment),
            false => self.state.items.push(comment),
        }
    }

    /// Removes `id` from the loaded window; a no-op when it is not there
    pub fn remove_by_id(&mut self, id: CommentId) {
        self.state.items.retain(|c| c.id != id);
    }

    /// UX-side authorship check for showing the delete affordance; the store
    /// enforces the real rule
    pub fn can_delete(&self, identity: Option<&Identity>, comment: &Comment) -> bool {
        identity.map_or(false, |me| me.id == comment.user_id)
    }

    /// Starts a create round-trip: validates the draft, takes the
    /// single-flight slot, and (in the optimistic variant) inserts a
    /// placeholder row
    pub fn begin_insert(
        &mut self,
        identity: Option<&Identity>,
        content: &str,
    ) -> Result<PendingComment, FeedError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(self.noticed(FeedError::EmptyContent));
        }
        let me = match identity {
            Some(me) => me.clone(),
            None => return Err(self.noticed(FeedError::AuthRequired)),
        };
        if self.creating {
            return Err(self.noticed(FeedError::DuplicateSubmission));
        }
        self.creating = true;
        let content = String::from(content);
        let placeholder = self.config.optimistic.then(|| {
            self.placeholder_seq -= 1;
            let comment = Comment {
                id: CommentId(self.placeholder_seq),
                content: content.clone(),
                created_at: chrono::Utc::now(),
                topic_id: self.topic,
                user_id: me.id,
                email: me.email.clone(),
            };
            let id = comment.id;
            self.insert_local(comment);
            id
        });
        Ok(PendingComment {
            generation: self.generation,
            placeholder,
            content,
            email: me.email,
        })
    }

    pub fn apply_insert(
        &mut self,
        pending: PendingComment,
        result: Result<Comment, Error>,
    ) -> Result<(), FeedError> {
        if pending.generation != self.generation {
            tracing::warn!("dropping create response from a previous feed generation");
            return Ok(());
        }
        self.creating = false;
        match result {
            Ok(mut row) => {
                // the raw comment row carries no denormalized email yet
                row.email = row.email.or(pending.email);
                match pending.placeholder {
                    Some(placeholder) => self.replace_local(placeholder, row),
                    None => self.insert_local(row),
                }
                Ok(())
            }
            Err(e) => {
                if let Some(placeholder) = pending.placeholder {
                    // rollback; the caller keeps the draft for a retry
                    self.remove_by_id(placeholder);
                }
                Err(self.noticed(FeedError::CreateFailed(e)))
            }
        }
    }

    /// Swaps the optimistic placeholder for the acknowledged row, keeping its
    /// position
    fn replace_local(&mut self, placeholder: CommentId, row: Comment) {
        if self.state.items.iter().any(|c| c.id == row.id) {
            // a page fetched in the meantime already brought the real row
            self.remove_by_id(placeholder);
            return;
        }
        match self.state.items.iter().position(|c| c.id == placeholder) {
            Some(i) => self.state.items[i] = row,
            None => self.insert_local(row),
        }
    }

    pub fn begin_count(&self) -> CountRequest {
        CountRequest {
            generation: self.generation,
        }
    }

    pub fn apply_count(&mut self, req: CountRequest, result: Result<u64, Error>) {
        if req.generation != self.generation {
            tracing::warn!("dropping count response from a previous feed generation");
            return;
        }
        match result {
            Ok(n) => self.state.total_count = n,
            Err(e) => self.notice(FeedError::Fetch(e)),
        }
    }
}

impl<S: Store> CommentFeed<S> {
    /// Initial fill: first page plus the independent total
    pub async fn open(&mut self) {
        self.load_more().await;
        self.refresh_total().await;
    }

    /// Loads the next window. Returns whether a round-trip was made; a store
    /// failure is surfaced through [`Self::take_error`] with prior state
    /// untouched.
    pub async fn load_more(&mut self) -> bool {
        let req = match self.begin_load_more() {
            Some(req) => req,
            None => return false,
        };
        let res = self
            .store
            .comments_page(self.topic, self.order(), req.range)
            .await;
        self.apply_page(req, res);
        true
    }

    /// Re-fetches the exact comment count, independent of the loaded window
    pub async fn refresh_total(&mut self) {
        let req = self.begin_count();
        let res = self.store.comments_count(self.topic).await;
        self.apply_count(req, res);
    }

    /// Submits the composer draft. On success the draft is cleared and the
    /// total re-fetched; on failure the draft is preserved so the user can
    /// retry.
    pub async fn submit(&mut self, composer: &mut CommentComposer) -> Result<(), FeedError> {
        let identity = match self.store.current_identity().await {
            Ok(identity) => identity,
            Err(e) => return Err(self.noticed(FeedError::Fetch(e))),
        };
        let pending = self.begin_insert(identity.as_ref(), composer.content())?;
        let res = self.store.insert_comment(pending.to_insert(self.topic)).await;
        self.apply_insert(pending, res)?;
        composer.clear();
        self.refresh_total().await;
        Ok(())
    }

    /// Pessimistic delete: nothing changes locally until the store confirms
    pub async fn delete(&mut self, id: CommentId) -> Result<(), FeedError> {
        match self.store.delete_comment(id).await {
            Ok(()) => {
                self.remove_by_id(id);
                self.refresh_total().await;
                Ok(())
            }
            Err(e) => Err(self.noticed(FeedError::DeleteFailed(e))),
        }
    }
}
