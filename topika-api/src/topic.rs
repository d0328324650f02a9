use crate::{Error, Time, UserId};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct TopicId(pub i64);

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicStatus {
    /// Saved draft, only visible to its author
    Temp,
    /// Published, visible in the public feed
    Publish,
}

/// A topic row. Topics are created as an empty row owned by their author and
/// filled in through `TopicPatch` updates, so everything the editor touches
/// is nullable.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Topic {
    pub id: TopicId,
    pub created_at: Time,
    pub author: UserId,

    pub title: Option<String>,
    /// Serialized rich-text document; opaque to this crate
    pub content: Option<String>,
    pub category: Option<String>,
    /// URL of the already-uploaded thumbnail
    pub thumbnail: Option<String>,
    pub status: Option<TopicStatus>,

    /// Server-maintained counters, only ever changed through the atomic RPCs
    pub views: i64,
    pub likes: i64,
}

impl TopicStatus {
    /// Wire spelling used in the status column
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicStatus::Temp => "temp",
            TopicStatus::Publish => "publish",
        }
    }
}

impl Topic {
    pub fn is_published(&self) -> bool {
        self.status == Some(TopicStatus::Publish)
    }

    pub fn is_draft(&self) -> bool {
        self.status == Some(TopicStatus::Temp)
    }
}

/// Partial update applied by the editor; `None` fields are left untouched
/// (and kept off the wire, so they cannot null out existing columns)
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct TopicPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TopicStatus>,
}

impl TopicPatch {
    // See comments on other `validate` functions throughout topika-api
    pub fn validate(&self) -> Result<(), Error> {
        for s in [&self.title, &self.content, &self.category, &self.thumbnail] {
            if let Some(s) = s {
                crate::validate_string(s)?;
            }
        }
        Ok(())
    }
}
