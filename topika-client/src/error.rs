use crate::api::Error;

/// Everything a feed operation can surface. All of these are recovered
/// locally: they end up as a dismissible notice on the owning component and
/// never make already-loaded content unusable.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum FeedError {
    #[error("failed fetching data from the store")]
    Fetch(#[source] Error),

    #[error("failed creating the record")]
    CreateFailed(#[source] Error),

    #[error("failed deleting the record")]
    DeleteFailed(#[source] Error),

    #[error("remote procedure call failed")]
    RpcFailed(#[source] Error),

    #[error("sign in to do this")]
    AuthRequired,

    #[error("a submission is already in flight")]
    DuplicateSubmission,

    #[error("comment content is empty")]
    EmptyContent,

    #[error("search terms need at least two characters")]
    SearchTooShort,

    #[error("required fields are missing: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}
