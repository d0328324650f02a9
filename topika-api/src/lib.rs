mod comment;
mod error;
mod query;
mod store;
mod topic;
mod user;

pub use comment::{Comment, CommentId, NewComment};
pub use error::Error;
pub use query::{OrderType, PageRange, SortBy, TopicFilter};
pub use store::Store;
pub use topic::{Topic, TopicId, TopicPatch, TopicStatus};
pub use user::{Identity, UserId};

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<chrono::Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

/// The backing store rejects NUL bytes in text columns, so catch them before
/// they ever reach the wire
pub fn validate_string(s: &str) -> Result<(), Error> {
    match s.contains('\0') {
        true => Err(Error::NullByteInString(s.to_string())),
        false => Ok(()),
    }
}
