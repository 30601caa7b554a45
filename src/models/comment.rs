use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::not_blank;

/// A comment on a post, together with a summary of its author.
///
/// `replies` is never stored; it is filled in by
/// [`build_tree`](crate::comment_tree::build_tree). Whole threads are sent
/// with [`write_json`](crate::comment_tree::write_json), since the derived
/// `Serialize` recurses once per reply level.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i32,
    pub content: String,
    pub post_id: i32,
    /// The comment this one replies to, or `None` for a top-level comment.
    pub parent_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<i32>,
    pub username: Option<String>,
    pub avatar: Option<String>,
    #[sqlx(skip)]
    #[serde(default)]
    pub replies: Vec<Comment>,
}

// Reply chains can be arbitrarily deep; dropping them one level per stack
// frame would overflow.
impl Drop for Comment {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut reply) = pending.pop() {
            pending.append(&mut reply.replies);
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(min = 1, max = 5000), custom = "not_blank")]
    pub content: String,
    #[serde(default, alias = "parentId")]
    pub parent_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentCreated {
    pub id: i32,
    pub message: String,
}

/// A comment as listed in the moderation console.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct AdminComment {
    pub id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: Option<String>,
    pub post_title: Option<String>,
    pub post_slug: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub comments: Vec<AdminComment>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_comments: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_input_validation() {
        let input: CommentInput = serde_json::from_str(r#"{"content":"Nice post"}"#).unwrap();
        assert!(input.validate().is_ok());
        assert!(input.parent_id.is_none());

        let reply: CommentInput =
            serde_json::from_str(r#"{"content":"Agreed","parentId":12}"#).unwrap();
        assert_eq!(reply.parent_id, Some(12));

        let blank: CommentInput = serde_json::from_str(r#"{"content":"   "}"#).unwrap();
        assert!(blank.validate().is_err());

        let too_long = CommentInput {
            content: "x".repeat(5001),
            parent_id: None,
        };
        assert!(too_long.validate().is_err());
    }

    fn comment(id: i32, parent_id: Option<i32>) -> Comment {
        Comment {
            id,
            content: format!("comment {}", id),
            post_id: 1,
            parent_id,
            created_at: Utc::now(),
            user_id: Some(5),
            username: Some("bob".to_string()),
            avatar: None,
            replies: Vec::new(),
        }
    }

    #[test]
    fn test_comment_serializes_nested_replies() {
        let mut root = comment(1, None);
        root.replies.push(comment(2, Some(1)));

        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(json["parent_id"], serde_json::Value::Null);
        assert_eq!(json["replies"][0]["id"], 2);
        assert_eq!(json["replies"][0]["parent_id"], 1);
        assert!(json["replies"][0]["replies"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_deep_reply_chain_drops() {
        let depth = 100_000;
        let mut thread = comment(depth, Some(depth - 1));
        for id in (0..depth).rev() {
            let mut parent = comment(id, if id == 0 { None } else { Some(id - 1) });
            parent.replies.push(thread);
            thread = parent;
        }
        assert_eq!(thread.id, 0);
        drop(thread);
    }
}
