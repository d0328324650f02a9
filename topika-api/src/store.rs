use async_trait::async_trait;

use crate::{
    Comment, CommentId, Error, Identity, NewComment, OrderType, PageRange, Topic, TopicFilter,
    TopicId, TopicPatch, UserId,
};

/// Client surface of the managed backing store. Implementations are expected
/// to enforce row-level rules (draft visibility, comment authorship) on their
/// side; any client-side check is a UX convenience, not a security boundary.
///
/// Methods take `&self` so one handle can be shared by several feed
/// instances; implementations use interior mutability where they need it.
#[async_trait]
pub trait Store {
    /// Ambient authentication context; `None` when nobody is signed in
    async fn current_identity(&self) -> Result<Option<Identity>, Error>;

    async fn fetch_topic(&self, id: TopicId) -> Result<Topic, Error>;

    /// Filtered listing; display ordering is the caller's business
    async fn fetch_topics(&self, filter: TopicFilter) -> Result<Vec<Topic>, Error>;

    /// Inserts the empty draft row a new topic starts from
    async fn create_topic(&self, author: UserId) -> Result<Topic, Error>;

    async fn update_topic(&self, id: TopicId, patch: TopicPatch) -> Result<(), Error>;

    async fn delete_topic(&self, id: TopicId) -> Result<(), Error>;

    /// `limit 1` existence probe; cheaper than counting when only a badge is
    /// at stake
    async fn has_drafts(&self, author: UserId) -> Result<bool, Error>;

    /// Comments of one topic ordered by `created_at`, sliced to the inclusive
    /// `range`. Returns fewer rows than the window only when the collection
    /// is exhausted.
    async fn comments_page(
        &self,
        topic: TopicId,
        order: OrderType,
        range: PageRange,
    ) -> Result<Vec<Comment>, Error>;

    /// Exact count of all comments of a topic, regardless of any window
    async fn comments_count(&self, topic: TopicId) -> Result<u64, Error>;

    /// Returns the inserted row with its server-assigned id and timestamp
    async fn insert_comment(&self, new: NewComment) -> Result<Comment, Error>;

    /// Idempotent; deleting an id that no longer exists is not an error
    async fn delete_comment(&self, id: CommentId) -> Result<(), Error>;

    async fn topic_likers(&self, topic: TopicId) -> Result<Vec<UserId>, Error>;

    /// Server-atomic like toggle for the current identity. Not expressible as
    /// a client-side read-modify-write: concurrent viewers would race.
    async fn toggle_like(&self, topic: TopicId) -> Result<(), Error>;

    /// Server-atomic view increment; returns the new counter value
    async fn increment_views(&self, topic: TopicId) -> Result<i64, Error>;
}
