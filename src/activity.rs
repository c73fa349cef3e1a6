//! Activity log entries recorded by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::TaskId;
use crate::user::UserId;

/// One line of the dashboard activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: u64,
    pub action: String,
    /// Acting user; `None` when the store has no current user.
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    pub created_at: DateTime<Utc>,
}

/// Describe how long ago `then` was, relative to `now` ("just now", "5 minutes ago", "3 days ago").
pub fn format_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now - then;
    let minutes = delta.num_minutes();
    if minutes < 1 {
        return "just now".into();
    }
    if minutes < 60 {
        return plural(minutes, "minute");
    }
    let hours = delta.num_hours();
    if hours < 24 {
        return plural(hours, "hour");
    }
    plural(delta.num_days(), "day")
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_ago() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(format_ago(now, now), "just now");
        assert_eq!(format_ago(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(format_ago(now - Duration::minutes(45), now), "45 minutes ago");
        assert_eq!(format_ago(now - Duration::hours(2), now), "2 hours ago");
        assert_eq!(format_ago(now - Duration::days(3), now), "3 days ago");
    }
}
