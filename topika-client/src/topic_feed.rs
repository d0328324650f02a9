use crate::{
    api::{SortBy, Store, Topic, TopicFilter},
    FeedError, SortByExt,
};

/// Fixed client-side page size of the published feed
pub const TOPICS_PER_PAGE: usize = 10;

/// One display window of the feed
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TopicPage {
    pub topics: Vec<Topic>,
    /// 1-based
    pub page: usize,
    pub total_pages: usize,
}

/// Browsing state for published topics: category filter and sort key drive
/// the fetch; search and pagination are windows over the fetched rows.
pub struct TopicFeed<S> {
    store: S,
    category: Option<String>,
    sort: SortBy,
    /// Active query, lowercased; empty means no search
    search: String,
    page: usize,
    topics: Vec<Topic>,
    last_error: Option<FeedError>,
}

impl<S: Store> TopicFeed<S> {
    pub fn new(store: S) -> TopicFeed<S> {
        TopicFeed {
            store,
            category: None,
            sort: SortBy::default(),
            search: String::new(),
            page: 1,
            topics: Vec::new(),
            last_error: None,
        }
    }

    pub fn sort(&self) -> SortBy {
        self.sort
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
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

    /// Re-runs the declarative query for the current `(category, sort)` key.
    /// On failure the previously fetched rows stay on screen.
    pub async fn refresh(&mut self) {
        let filter = TopicFilter::published().with_category(self.category.clone());
        match self.store.fetch_topics(filter).await {
            Ok(mut topics) => {
                self.sort.sort(&mut topics);
                self.topics = topics;
            }
            Err(e) => self.notice(FeedError::Fetch(e)),
        }
    }

    /// Category switch resets sort, search and pagination, then re-fetches
    pub async fn set_category(&mut self, category: Option<String>) {
        self.category = category;
        self.sort = SortBy::Latest;
        self.search.clear();
        self.page = 1;
        self.refresh().await;
    }

    pub async fn set_sort(&mut self, sort: SortBy) {
        self.sort = sort;
        self.refresh().await;
    }

    /// Runs a search over title and content. The query must keep at least two
    /// characters once trimmed.
    pub async fn search(&mut self, input: &str) -> Result<(), FeedError> {
        let query = input.trim();
        if query.chars().count() < 2 {
            return Err(self.noticed(FeedError::SearchTooShort));
        }
        self.refresh().await;
        self.search = query.to_lowercase();
        self.page = 1;
        Ok(())
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
        self.page = 1;
    }

    fn visible(&self) -> Vec<&Topic> {
        if self.search.is_empty() {
            return self.topics.iter().collect();
        }
        self.topics
            .iter()
            .filter(|t| {
                let title = t.title.as_deref().unwrap_or_default().to_lowercase();
                let content = t.content.as_deref().unwrap_or_default().to_lowercase();
                title.contains(&self.search) || content.contains(&self.search)
            })
            .collect()
    }

    fn total_pages(&self) -> usize {
        (self.visible().len() + TOPICS_PER_PAGE - 1) / TOPICS_PER_PAGE
    }

    /// Current display window
    pub fn current_page(&self) -> TopicPage {
        let visible = self.visible();
        let total_pages = self.total_pages();
        let page = self.page.min(total_pages.max(1));
        let topics = visible
            .into_iter()
            .skip((page - 1) * TOPICS_PER_PAGE)
            .take(TOPICS_PER_PAGE)
            .cloned()
            .collect();
        TopicPage {
            topics,
            page,
            total_pages,
        }
    }

    /// Clamped to the valid page span
    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages().max(1));
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page + 1);
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }
}
