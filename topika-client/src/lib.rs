mod comment_feed;
pub use comment_feed::{
    CommentFeed, CommentFeedConfig, CommentFeedState, CountRequest, FeedStage, LoadMoreThrottle,
    PageRequest, PendingComment,
};

mod composer;
pub use composer::CommentComposer;

mod editor;
pub use editor::{Drafts, TopicEditor};

mod error;
pub use error::FeedError;

mod rest;
pub use rest::{RestConfig, RestStore};

mod sort;
pub use sort::SortByExt;

mod topic_feed;
pub use topic_feed::{TopicFeed, TopicPage, TOPICS_PER_PAGE};

mod topic_view;
pub use topic_view::TopicView;

pub mod api {
    pub use topika_api::*;
}

pub mod prelude {
    pub use crate::SortByExt;
}
