use std::cmp::Reverse;

use crate::api::{SortBy, Topic};

pub trait SortByExt {
    fn sort(&self, topics: &mut [Topic]);
}

impl SortByExt for SortBy {
    /// Biggest value first; ties broken by id so the order is stable across
    /// refreshes
    fn sort(&self, topics: &mut [Topic]) {
        match self {
            SortBy::Latest => topics.sort_unstable_by_key(|t| (Reverse(t.created_at), t.id)),
            SortBy::Likes => topics.sort_unstable_by_key(|t| (Reverse(t.likes), t.id)),
            SortBy::Views => topics.sort_unstable_by_key(|t| (Reverse(t.views), t.id)),
        }
    }
}
