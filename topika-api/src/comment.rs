use crate::{Error, Time, TopicId, UserId};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub i64);

/// One row of the store's comment/user view. Immutable once created; the only
/// mutation comments ever see is deletion.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub created_at: Time,
    pub topic_id: TopicId,
    pub user_id: UserId,

    /// Display label denormalized from the user table by the view; absent for
    /// accounts without an email, and missing entirely on raw comment-table
    /// rows (such as an insert's returned representation)
    #[serde(default)]
    pub email: Option<String>,
}

/// Insert payload. The store fills in `id`, `created_at` and `user_id` (the
/// latter from the ambient identity) and returns the full row.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub topic_id: TopicId,
    pub content: String,
}

impl NewComment {
    // See comments on other `validate` functions throughout topika-api
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.content)
    }
}
