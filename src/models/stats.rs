use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{PostStatus, User};

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct RecentPost {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub author: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct RecentComment {
    pub id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: Option<String>,
    pub post_title: Option<String>,
}

/// Site-wide totals shown on the admin dashboard.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_posts: i64,
    pub total_comments: i64,
    pub total_categories: i64,
    /// Keyed by status name; statuses with no posts are absent.
    pub posts_by_status: HashMap<String, i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_posts: Vec<RecentPost>,
    pub recent_comments: Vec<RecentComment>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub users: Vec<User>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_users: i64,
}

/// A post as listed in the admin and moderation consoles, drafts included.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct AdminPostRow {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub status: PostStatus,
    pub views: i32,
    pub created_at: DateTime<Utc>,
    pub author: Option<String>,
    pub category_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminPostPage {
    pub posts: Vec<AdminPostRow>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_posts: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_json_shape() {
        let dashboard = Dashboard {
            stats: DashboardStats {
                total_users: 3,
                total_posts: 5,
                total_comments: 8,
                total_categories: 2,
                posts_by_status: HashMap::from([
                    ("published".to_string(), 4),
                    ("draft".to_string(), 1),
                ]),
            },
            recent_posts: Vec::new(),
            recent_comments: Vec::new(),
        };

        let json = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(json["stats"]["totalUsers"], 3);
        assert_eq!(json["stats"]["postsByStatus"]["draft"], 1);
        assert!(json["recentPosts"].as_array().unwrap().is_empty());
    }
}
