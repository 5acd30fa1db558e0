//! Post publication state machine
//!
//! States are DRAFT, SCHEDULED and PUBLISHED. The transitions here are pure
//! functions of the requested values and the current time; the only I/O is
//! [`sweep`], which publishes every due scheduled post and runs at the start
//! of each read path.

use crate::repositories::{PostRecord, PostRepository, StoreResult};
use blog_shared::PostStatus;
use chrono::{DateTime, Utc};
use tracing::info;

/// Publication fields of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Publication {
    pub status: PostStatus,
    pub publish_date: Option<DateTime<Utc>>,
    pub is_scheduled: bool,
}

impl Publication {
    pub const DRAFT: Publication = Publication {
        status: PostStatus::Draft,
        publish_date: None,
        is_scheduled: false,
    };

    pub fn of(post: &PostRecord) -> Self {
        Self {
            status: post.status,
            publish_date: post.publish_date,
            is_scheduled: post.is_scheduled,
        }
    }

    pub fn apply(self, post: &mut PostRecord) {
        post.status = self.status;
        post.publish_date = self.publish_date;
        post.is_scheduled = self.is_scheduled;
    }
}

/// Resolve a requested status and publish date into a consistent state.
///
/// - explicit PUBLISHED: published at the given date, or now
/// - explicit DRAFT: draft with no date
/// - otherwise a future date schedules, a past or present date publishes,
///   and no date leaves an unscheduled SCHEDULED (if asked) or a DRAFT
pub fn resolve(
    requested: Option<PostStatus>,
    publish_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Publication {
    match (requested, publish_date) {
        (Some(PostStatus::Published), date) => Publication {
            status: PostStatus::Published,
            publish_date: Some(date.unwrap_or(now)),
            is_scheduled: false,
        },
        (Some(PostStatus::Draft), _) => Publication::DRAFT,
        (_, Some(date)) if date > now => Publication {
            status: PostStatus::Scheduled,
            publish_date: Some(date),
            is_scheduled: true,
        },
        (_, Some(date)) => Publication {
            status: PostStatus::Published,
            publish_date: Some(date),
            is_scheduled: false,
        },
        (Some(PostStatus::Scheduled), None) => Publication {
            status: PostStatus::Scheduled,
            publish_date: None,
            is_scheduled: false,
        },
        (None, None) => Publication::DRAFT,
    }
}

/// Force PUBLISHED as of now
pub fn publish(now: DateTime<Utc>) -> Publication {
    Publication {
        status: PostStatus::Published,
        publish_date: Some(now),
        is_scheduled: false,
    }
}

/// Back to an unscheduled SCHEDULED state awaiting a new date
pub fn unpublish() -> Publication {
    Publication {
        status: PostStatus::Scheduled,
        publish_date: None,
        is_scheduled: false,
    }
}

/// Schedule for `date`, which must be strictly in the future
pub fn schedule(date: DateTime<Utc>, now: DateTime<Utc>) -> Result<Publication, String> {
    if date <= now {
        return Err("Publish date must be in the future".to_string());
    }
    Ok(Publication {
        status: PostStatus::Scheduled,
        publish_date: Some(date),
        is_scheduled: true,
    })
}

/// Publish every scheduled post whose date has passed. Returns how many changed.
pub async fn sweep(posts: &dyn PostRepository, now: DateTime<Utc>) -> StoreResult<u64> {
    let published = posts.publish_due(now).await?;
    if published > 0 {
        info!(count = published, "Auto-published scheduled posts");
    }
    Ok(published)
}
