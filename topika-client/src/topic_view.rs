use crate::{
    api::{Identity, Store, Topic, TopicId, UserId},
    FeedError,
};

/// Detail-view state for one topic: the row itself, the view counter, and the
/// like list. Opening the view bumps the counter.
pub struct TopicView<S> {
    store: S,
    topic: Topic,
    likers: Vec<UserId>,
    last_error: Option<FeedError>,
}

impl<S: Store> TopicView<S> {
    /// Fetches the row, bumps the view counter, and loads the liker list
    pub async fn open(store: S, id: TopicId) -> Result<TopicView<S>, FeedError> {
        let topic = store.fetch_topic(id).await.map_err(FeedError::Fetch)?;
        let mut view = TopicView {
            store,
            topic,
            likers: Vec::new(),
            last_error: None,
        };
        view.increment_views().await;
        view.refresh_likers().await;
        Ok(view)
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

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

    /// Optimistic `views + 1`, rolled back if the RPC fails and reconciled
    /// with the server value when it settles
    pub async fn increment_views(&mut self) {
        self.topic.views += 1;
        match self.store.increment_views(self.topic.id).await {
            Ok(views) => self.topic.views = views,
            Err(e) => {
                self.topic.views -= 1;
                self.notice(FeedError::RpcFailed(e));
            }
        }
    }

    pub async fn refresh_likers(&mut self) {
        match self.store.topic_likers(self.topic.id).await {
            Ok(likers) => self.likers = likers,
            Err(e) => self.notice(FeedError::Fetch(e)),
        }
    }

    pub fn likes_count(&self) -> usize {
        self.likers.len()
    }

    pub fn is_liked_by(&self, identity: Option<&Identity>) -> bool {
        identity.map_or(false, |me| self.likers.contains(&me.id))
    }

    /// Toggles the current user's like through the atomic RPC. The local list
    /// only changes once the store confirms.
    pub async fn toggle_like(&mut self) -> Result<(), FeedError> {
        match self.store.current_identity().await {
            Err(e) => return Err(self.noticed(FeedError::Fetch(e))),
            Ok(None) => return Err(self.noticed(FeedError::AuthRequired)),
            Ok(Some(_)) => (),
        }
        match self.store.toggle_like(self.topic.id).await {
            Ok(()) => {
                self.refresh_likers().await;
                // pick up the server-maintained counter as well
                if let Ok(topic) = self.store.fetch_topic(self.topic.id).await {
                    self.topic = topic;
                }
                Ok(())
            }
            Err(e) => Err(self.noticed(FeedError::RpcFailed(e))),
        }
    }

    /// UX-side authorship check; the store enforces the real rule
    pub fn can_delete(&self, identity: Option<&Identity>) -> bool {
        identity.map_or(false, |me| me.id == self.topic.author)
    }

    pub async fn delete(&mut self) -> Result<(), FeedError> {
        match self.store.delete_topic(self.topic.id).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.noticed(FeedError::DeleteFailed(e))),
        }
    }
}
