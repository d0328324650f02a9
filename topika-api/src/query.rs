use crate::{Topic, TopicStatus, UserId};

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum OrderType {
    Asc,
    Desc,
}

/// Feed sort keys; the feed always shows the biggest value first
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum SortBy {
    #[default]
    Latest,
    Likes,
    Views,
}

impl SortBy {
    /// Column the store orders by for this key
    pub fn column(&self) -> &'static str {
        match self {
            SortBy::Latest => "created_at",
            SortBy::Likes => "likes",
            SortBy::Views => "views",
        }
    }
}

/// Inclusive row window `[from, to]`, the range convention of the backing
/// store. A window never straddles `u64::MAX`, so `len` cannot overflow.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PageRange {
    pub from: u64,
    pub to: u64,
}

impl PageRange {
    /// Window of `size` rows starting at `offset`. Panics on a zero-sized
    /// window, which no caller has a meaning for.
    pub fn window(offset: u64, size: u64) -> PageRange {
        assert!(size > 0, "requested an empty page window");
        PageRange {
            from: offset,
            to: offset + size - 1,
        }
    }

    pub fn len(&self) -> u64 {
        self.to - self.from + 1
    }
}

/// Conjunctive equality filters over topic rows
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct TopicFilter {
    pub status: Option<TopicStatus>,
    pub category: Option<String>,
    pub author: Option<UserId>,
}

impl TopicFilter {
    /// Everything the public feed shows
    pub fn published() -> TopicFilter {
        TopicFilter {
            status: Some(TopicStatus::Publish),
            ..TopicFilter::default()
        }
    }

    /// Unpublished work of one author
    pub fn drafts_of(author: UserId) -> TopicFilter {
        TopicFilter {
            status: Some(TopicStatus::Temp),
            author: Some(author),
            ..TopicFilter::default()
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> TopicFilter {
        self.category = category;
        self
    }

    pub fn matches(&self, t: &Topic) -> bool {
        if let Some(status) = self.status {
            if t.status != Some(status) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if t.category.as_deref() != Some(category) {
                return false;
            }
        }
        if let Some(author) = self.author {
            if t.author != author {
                return false;
            }
        }
        true
    }
}
