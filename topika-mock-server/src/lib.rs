use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use topika_api::{
    Comment, CommentId, Error, Identity, NewComment, OrderType, PageRange, Store, Time, Topic,
    TopicFilter, TopicId, TopicPatch, UserId, Uuid,
};

/// Which store operation the next injected failure should hit
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Failure {
    Fetch,
    Insert,
    Delete,
    Rpc,
}

/// In-memory rendition of the managed backing store: server-assigned ids and
/// monotonic timestamps, ambient sessions, row-level authorship rules, the
/// two atomic counter RPCs, and one-shot failure injection for tests.
///
/// Cloning returns another handle onto the same store.
#[derive(Clone)]
pub struct MockServer(Arc<Mutex<Inner>>);

struct Inner {
    users: BTreeMap<UserId, String>,
    identity: Option<Identity>,
    identity_feeds: Vec<mpsc::UnboundedSender<Option<Identity>>>,

    topics: BTreeMap<TopicId, Topic>,
    comments: BTreeMap<CommentId, Comment>,
    likes: BTreeSet<(TopicId, UserId)>,

    next_topic_id: i64,
    next_comment_id: i64,
    epoch: Time,
    seq: i64,

    fail_next: Option<Failure>,
    insert_requests: usize,
}

impl Inner {
    /// Server clock; strictly monotonic so `created_at` orders inserts
    fn tick(&mut self) -> Time {
        self.seq += 1;
        self.epoch + chrono::Duration::seconds(self.seq)
    }

    fn take_failure(&mut self, op: Failure) -> Result<(), Error> {
        if self.fail_next == Some(op) {
            self.fail_next = None;
            return Err(Error::Unknown(String::from("injected failure")));
        }
        Ok(())
    }

    fn signed_in(&self) -> Result<Identity, Error> {
        self.identity.clone().ok_or(Error::PermissionDenied)
    }

    fn refresh_like_count(&mut self, topic: TopicId) {
        let count = self
            .likes
            .iter()
            .filter(|(t, _)| *t == topic)
            .count() as i64;
        if let Some(t) = self.topics.get_mut(&topic) {
            t.likes = count;
        }
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer(Arc::new(Mutex::new(Inner {
            users: BTreeMap::new(),
            identity: None,
            identity_feeds: Vec::new(),
            topics: BTreeMap::new(),
            comments: BTreeMap::new(),
            likes: BTreeSet::new(),
            next_topic_id: 0,
            next_comment_id: 0,
            epoch: chrono::Utc::now(),
            seq: 0,
            fail_next: None,
            insert_requests: 0,
        })))
    }

    pub fn admin_create_user(&self, email: &str) -> UserId {
        let id = UserId(Uuid::new_v4());
        self.0.lock().users.insert(id, String::from(email));
        id
    }

    /// Opens a session for `user` and notifies identity subscribers
    pub fn sign_in(&self, user: UserId) -> Identity {
        let mut inner = self.0.lock();
        let email = inner
            .users
            .get(&user)
            .unwrap_or_else(|| panic!("signing in user {user:?} that was never created"))
            .clone();
        let identity = Identity {
            id: user,
            email: Some(email),
        };
        inner.identity = Some(identity.clone());
        let update = inner.identity.clone();
        inner
            .identity_feeds
            .retain_mut(|f| f.send(update.clone()).is_ok());
        identity
    }

    pub fn sign_out(&self) {
        let mut inner = self.0.lock();
        inner.identity = None;
        inner.identity_feeds.retain_mut(|f| f.send(None).is_ok());
    }

    /// Change-subscription for the ambient identity
    pub fn identity_feed(&self) -> mpsc::UnboundedReceiver<Option<Identity>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.0.lock().identity_feeds.push(sender);
        receiver
    }

    /// Makes the next store operation of kind `op` fail once
    pub fn fail_next(&self, op: Failure) {
        self.0.lock().fail_next = Some(op);
    }

    /// Number of comment-insert requests that reached the store, including
    /// failed ones
    pub fn test_insert_requests(&self) -> usize {
        self.0.lock().insert_requests
    }
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}

#[async_trait]
impl Store for MockServer {
    async fn current_identity(&self) -> Result<Option<Identity>, Error> {
        let mut inner = self.0.lock();
        inner.take_failure(Failure::Fetch)?;
        Ok(inner.identity.clone())
    }

    async fn fetch_topic(&self, id: TopicId) -> Result<Topic, Error> {
        let mut inner = self.0.lock();
        inner.take_failure(Failure::Fetch)?;
        inner.topics.get(&id).cloned().ok_or(Error::NotFound)
    }

    async fn fetch_topics(&self, filter: TopicFilter) -> Result<Vec<Topic>, Error> {
        let mut inner = self.0.lock();
        inner.take_failure(Failure::Fetch)?;
        Ok(inner
            .topics
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn create_topic(&self, author: UserId) -> Result<Topic, Error> {
        let mut inner = self.0.lock();
        inner.take_failure(Failure::Insert)?;
        inner.next_topic_id += 1;
        let topic = Topic {
            id: TopicId(inner.next_topic_id),
            created_at: inner.tick(),
            author,
            title: None,
            content: None,
            category: None,
            thumbnail: None,
            status: None,
            views: 0,
            likes: 0,
        };
        inner.topics.insert(topic.id, topic.clone());
        Ok(topic)
    }

    async fn update_topic(&self, id: TopicId, patch: TopicPatch) -> Result<(), Error> {
        patch.validate()?;
        let mut inner = self.0.lock();
        inner.take_failure(Failure::Insert)?;
        let t = inner.topics.get_mut(&id).ok_or(Error::NotFound)?;
        if let Some(title) = patch.title {
            t.title = Some(title);
        }
        if let Some(content) = patch.content {
            t.content = Some(content);
        }
        if let Some(category) = patch.category {
            t.category = Some(category);
        }
        if let Some(thumbnail) = patch.thumbnail {
            t.thumbnail = Some(thumbnail);
        }
        if let Some(status) = patch.status {
            t.status = Some(status);
        }
        Ok(())
    }

    async fn delete_topic(&self, id: TopicId) -> Result<(), Error> {
        let mut inner = self.0.lock();
        inner.take_failure(Failure::Delete)?;
        let me = inner.signed_in()?;
        match inner.topics.get(&id) {
            None => return Ok(()), // idempotent
            Some(t) if t.author != me.id => return Err(Error::PermissionDenied),
            Some(_) => (),
        }
        inner.topics.remove(&id);
        inner.comments.retain(|_, c| c.topic_id != id);
        inner.likes.retain(|(t, _)| *t != id);
        Ok(())
    }

    async fn has_drafts(&self, author: UserId) -> Result<bool, Error> {
        let mut inner = self.0.lock();
        inner.take_failure(Failure::Fetch)?;
        let filter = TopicFilter::drafts_of(author);
        Ok(inner.topics.values().any(|t| filter.matches(t)))
    }

    async fn comments_page(
        &self,
        topic: TopicId,
        order: OrderType,
        range: PageRange,
    ) -> Result<Vec<Comment>, Error> {
        let mut inner = self.0.lock();
        inner.take_failure(Failure::Fetch)?;
        let mut rows = inner
            .comments
            .values()
            .filter(|c| c.topic_id == topic)
            .cloned()
            .collect::<Vec<_>>();
        match order {
            OrderType::Asc => rows.sort_unstable_by_key(|c| (c.created_at, c.id)),
            OrderType::Desc => rows.sort_unstable_by_key(|c| (Reverse(c.created_at), c.id)),
        }
        Ok(rows
            .into_iter()
            .skip(range.from as usize)
            .take(range.len() as usize)
            .collect())
    }

    async fn comments_count(&self, topic: TopicId) -> Result<u64, Error> {
        let mut inner = self.0.lock();
        inner.take_failure(Failure::Fetch)?;
        Ok(inner.comments.values().filter(|c| c.topic_id == topic).count() as u64)
    }

    async fn insert_comment(&self, new: NewComment) -> Result<Comment, Error> {
        let mut inner = self.0.lock();
        inner.insert_requests += 1;
        inner.take_failure(Failure::Insert)?;
        new.validate()?;
        let me = inner.signed_in()?;
        if !inner.topics.contains_key(&new.topic_id) {
            return Err(Error::NotFound);
        }
        inner.next_comment_id += 1;
        let comment = Comment {
            id: CommentId(inner.next_comment_id),
            content: new.content,
            created_at: inner.tick(),
            topic_id: new.topic_id,
            user_id: me.id,
            email: me.email,
        };
        inner.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), Error> {
        let mut inner = self.0.lock();
        inner.take_failure(Failure::Delete)?;
        let me = inner.signed_in()?;
        match inner.comments.get(&id) {
            None => return Ok(()), // idempotent
            Some(c) if c.user_id != me.id => return Err(Error::PermissionDenied),
            Some(_) => (),
        }
        inner.comments.remove(&id);
        Ok(())
    }

    async fn topic_likers(&self, topic: TopicId) -> Result<Vec<UserId>, Error> {
        let mut inner = self.0.lock();
        inner.take_failure(Failure::Fetch)?;
        Ok(inner
            .likes
            .iter()
            .filter(|(t, _)| *t == topic)
            .map(|(_, u)| *u)
            .collect())
    }

    async fn toggle_like(&self, topic: TopicId) -> Result<(), Error> {
        let mut inner = self.0.lock();
        inner.take_failure(Failure::Rpc)?;
        let me = inner.signed_in()?;
        if !inner.topics.contains_key(&topic) {
            return Err(Error::NotFound);
        }
        if !inner.likes.remove(&(topic, me.id)) {
            inner.likes.insert((topic, me.id));
        }
        inner.refresh_like_count(topic);
        Ok(())
    }

    async fn increment_views(&self, topic: TopicId) -> Result<i64, Error> {
        let mut inner = self.0.lock();
        inner.take_failure(Failure::Rpc)?;
        let t = inner.topics.get_mut(&topic).ok_or(Error::NotFound)?;
        t.views += 1;
        Ok(t.views)
    }
}
