//! Source-group snapshot types and engagement scoring.
//!
//! A [`SourceSnapshot`] is the immutable result of fetching a VK group and
//! its recent wall posts. It is owned by exactly one generation run and is
//! never shared across chats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Weight of a comment relative to a like when scoring engagement.
pub const COMMENT_WEIGHT: i64 = 2;
/// Weight of a repost relative to a like when scoring engagement.
pub const REPOST_WEIGHT: i64 = 3;

/// Identity of the analysed VK group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: i64,
    pub screen_name: String,
    pub name: String,
    pub description: String,
    pub members_count: i64,
    /// Free-form status line, empty when the group has none.
    #[serde(default)]
    pub status: String,
}

/// One wall post with its reaction counters and derived engagement score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub post_id: i64,
    pub likes: i64,
    pub comments: i64,
    pub reposts: i64,
    pub views: i64,
    /// Derived via [`engagement`]; stored so sorting does not recompute.
    pub engagement: f64,
    pub text: String,
    /// Publication time, when VK reported one.
    pub posted_at: Option<DateTime<Utc>>,
}

/// A fetched group plus its recent posts, ordered as returned by the wall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSnapshot {
    pub group: GroupInfo,
    pub posts: Vec<ContentItem>,
}

/// Engagement score of a post: `(likes + 2*comments + 3*reposts) / views`.
///
/// Posts with no recorded views score `0.0` — they carry no reach signal,
/// so their reactions cannot be normalised.
pub fn engagement(likes: i64, comments: i64, reposts: i64, views: i64) -> f64 {
    if views <= 0 {
        return 0.0;
    }
    (likes + comments * COMMENT_WEIGHT + reposts * REPOST_WEIGHT) as f64 / views as f64
}

impl SourceSnapshot {
    /// The `n` highest-engagement posts, best first.
    ///
    /// Ties keep the original wall order (the sort is stable).
    pub fn top_by_engagement(&self, n: usize) -> Vec<&ContentItem> {
        let mut sorted: Vec<&ContentItem> = self.posts.iter().collect();
        sorted.sort_by(|a, b| {
            b.engagement
                .partial_cmp(&a.engagement)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted.truncate(n);
        sorted
    }
}
