use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{not_blank, PostSummary};

/// A free-form label attached to posts. Created on demand from tag names.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Tag {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A category together with the number of published posts filed under it.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct CategoryWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub category: Category,
    pub post_count: i64,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 100), custom = "not_blank")]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Published posts of one category, one page at a time.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPosts {
    pub category: Category,
    pub posts: Vec<PostSummary>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_posts: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_input_validation() {
        let input: CategoryInput =
            serde_json::from_str(r#"{"name":"Technology","description":"Gadgets"}"#).unwrap();
        assert!(input.validate().is_ok());

        let blank = CategoryInput {
            name: " ".to_string(),
            description: None,
        };
        assert!(blank.validate().is_err());

        let long = CategoryInput {
            name: "n".repeat(101),
            description: None,
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_category_with_count_is_flat_json() {
        let row = CategoryWithCount {
            category: Category {
                id: 2,
                name: "Travel".to_string(),
                slug: "travel".to_string(),
                description: None,
                created_at: Utc::now(),
            },
            post_count: 4,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["slug"], "travel");
        assert_eq!(json["post_count"], 4);
    }
}
