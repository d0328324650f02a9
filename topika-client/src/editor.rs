use crate::{
    api::{SortBy, Store, Topic, TopicFilter, TopicId, TopicPatch, TopicStatus, UserId},
    FeedError, SortByExt,
};

/// Authoring state for one topic. A topic starts as an empty row owned by its
/// author and is patched toward `temp` (saved draft) or `publish`.
pub struct TopicEditor<S> {
    store: S,
    id: TopicId,

    pub title: String,
    /// Serialized rich-text document, opaque here
    pub content: String,
    pub category: String,
    /// URL of the already-uploaded thumbnail
    pub thumbnail: Option<String>,
}

impl<S> TopicEditor<S> {
    fn from_topic(store: S, topic: Topic) -> TopicEditor<S> {
        TopicEditor {
            store,
            id: topic.id,
            title: topic.title.unwrap_or_default(),
            content: topic.content.unwrap_or_default(),
            category: topic.category.unwrap_or_default(),
            thumbnail: topic.thumbnail,
        }
    }

    pub fn id(&self) -> TopicId {
        self.id
    }

    /// Fields still to fill in before save or publish goes through
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.content.trim().is_empty() {
            missing.push("content");
        }
        if self.category.trim().is_empty() {
            missing.push("category");
        }
        if self.thumbnail.is_none() {
            missing.push("thumbnail");
        }
        missing
    }
}

impl<S: Store> TopicEditor<S> {
    /// Creates the empty draft row a new topic starts from and opens it for
    /// editing. Requires a signed-in author.
    pub async fn create(store: S) -> Result<TopicEditor<S>, FeedError> {
        let me = match store.current_identity().await {
            Err(e) => return Err(FeedError::Fetch(e)),
            Ok(None) => return Err(FeedError::AuthRequired),
            Ok(Some(me)) => me,
        };
        let topic = store
            .create_topic(me.id)
            .await
            .map_err(FeedError::CreateFailed)?;
        Ok(TopicEditor::from_topic(store, topic))
    }

    /// Re-opens an existing topic for editing
    pub async fn load(store: S, id: TopicId) -> Result<TopicEditor<S>, FeedError> {
        let topic = store.fetch_topic(id).await.map_err(FeedError::Fetch)?;
        Ok(TopicEditor::from_topic(store, topic))
    }

    /// Stores the work in progress as a draft, visible only to its author
    pub async fn save(&mut self) -> Result<(), FeedError> {
        self.put(TopicStatus::Temp).await
    }

    /// Makes the topic visible in the public feed
    pub async fn publish(&mut self) -> Result<(), FeedError> {
        self.put(TopicStatus::Publish).await
    }

    async fn put(&mut self, status: TopicStatus) -> Result<(), FeedError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(FeedError::MissingFields(missing));
        }
        let patch = TopicPatch {
            title: Some(self.title.clone()),
            content: Some(self.content.clone()),
            category: Some(self.category.clone()),
            thumbnail: self.thumbnail.clone(),
            status: Some(status),
        };
        self.store
            .update_topic(self.id, patch)
            .await
            .map_err(FeedError::CreateFailed)
    }
}

/// Backing state for the saved-drafts dialog: listing, badge probe, deletion
pub struct Drafts<S> {
    store: S,
}

impl<S: Store> Drafts<S> {
    pub fn new(store: S) -> Drafts<S> {
        Drafts { store }
    }

    /// The author's unpublished topics, newest first
    pub async fn list(&self, me: UserId) -> Result<Vec<Topic>, FeedError> {
        let mut drafts = self
            .store
            .fetch_topics(TopicFilter::drafts_of(me))
            .await
            .map_err(FeedError::Fetch)?;
        SortBy::Latest.sort(&mut drafts);
        Ok(drafts)
    }

    /// Cheap existence probe backing the "you have drafts" badge
    pub async fn has_any(&self, me: UserId) -> Result<bool, FeedError> {
        self.store.has_drafts(me).await.map_err(FeedError::Fetch)
    }

    pub async fn delete(&self, id: TopicId) -> Result<(), FeedError> {
        self.store
            .delete_topic(id)
            .await
            .map_err(FeedError::DeleteFailed)
    }
}
