use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Postgres, QueryBuilder};
use validator::Validate;

use super::{not_blank, Tag};

/// Publication state of a post.
/// Corresponds to the `post_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "post_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Visible only to its author and the moderation console.
    Draft,
    /// Publicly listed.
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

/// Payload for creating or updating a post.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PostInput {
    /// Required, at most 255 characters.
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub title: String,

    #[validate(length(min = 1), custom = "not_blank")]
    pub content: String,

    #[validate(length(max = 500))]
    pub excerpt: Option<String>,

    pub category_id: Option<i32>,

    /// Defaults to `draft` on creation and to the stored status on update.
    pub status: Option<PostStatus>,

    #[validate(length(max = 500))]
    pub featured_image: Option<String>,

    #[validate(length(max = 160, message = "Meta description must be less than 160 characters"))]
    pub meta_description: Option<String>,

    #[validate(length(max = 100, message = "Focus keyword must be less than 100 characters"))]
    pub focus_keyword: Option<String>,

    /// Explicit slug; normalized before use and takes precedence over the title.
    #[validate(length(max = 255))]
    pub custom_slug: Option<String>,

    /// Transliterate a Bangla title (and tag names) to Latin when building slugs.
    #[serde(default)]
    pub transliterate_slug: bool,

    /// Tag names. On update, `None` keeps the current tags.
    pub tags: Option<Vec<String>>,
}

impl PostInput {
    /// The explicit slug override, if one was given and is not blank.
    pub fn slug_override(&self) -> Option<&str> {
        self.custom_slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A post row as stored in the database.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub meta_description: Option<String>,
    pub focus_keyword: Option<String>,
    pub status: PostStatus,
    pub views: i32,
    pub user_id: i32,
    pub category_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post as shown in listings, joined with its author and category.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct PostSummary {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub status: PostStatus,
    pub views: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Option<i32>,
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
}

/// Column list matching [`PostSummary`]; callers append `WHERE`/`ORDER BY`.
pub const POST_SUMMARY_SELECT: &str = "SELECT p.id, p.title, p.slug, p.excerpt, p.featured_image, \
     p.status, p.views, p.created_at, p.updated_at, \
     u.id AS user_id, u.username, u.avatar, \
     c.id AS category_id, c.name AS category_name, c.slug AS category_slug \
     FROM posts p \
     LEFT JOIN users u ON p.user_id = u.id \
     LEFT JOIN categories c ON p.category_id = c.id";

/// Row source for counting posts under the same filter as [`POST_SUMMARY_SELECT`].
pub const POST_COUNT_SELECT: &str = "SELECT COUNT(*) FROM posts p \
     LEFT JOIN categories c ON p.category_id = c.id";

/// A single post with its author, category and tags.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct PostDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub post: Post,
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    #[sqlx(skip)]
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Structured post filter, rendered into a parameterized `WHERE` clause.
///
/// Every value is sent as a bind parameter; only fixed SQL fragments are
/// pushed as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    /// Substring match over title, content, meta description and focus keyword.
    pub search: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    /// Tag slug.
    pub tag: Option<String>,
    pub author_id: Option<i32>,
}

impl PostFilter {
    pub fn published() -> Self {
        Self {
            status: Some(PostStatus::Published),
            ..Self::default()
        }
    }

    /// Appends ` WHERE ...` (or nothing) to a query selecting from `posts p`
    /// joined with `categories c`.
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let mut first = true;

        if let Some(status) = self.status {
            push_clause(builder, &mut first);
            builder.push("p.status = ").push_bind(status);
        }

        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            push_clause(builder, &mut first);
            builder
                .push("(p.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.content ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.meta_description ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.focus_keyword ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if let Some(category) = &self.category {
            push_clause(builder, &mut first);
            builder.push("c.slug = ").push_bind(category.clone());
        }

        if let Some(tag) = &self.tag {
            push_clause(builder, &mut first);
            builder
                .push(
                    "EXISTS (SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
                     WHERE pt.post_id = p.id AND t.slug = ",
                )
                .push_bind(tag.clone())
                .push(")");
        }

        if let Some(author_id) = self.author_id {
            push_clause(builder, &mut first);
            builder.push("p.user_id = ").push_bind(author_id);
        }
    }
}

fn push_clause(builder: &mut QueryBuilder<'_, Postgres>, first: &mut bool) {
    builder.push(if *first { " WHERE " } else { " AND " });
    *first = false;
}

/// Query string of `GET /api/posts`.
#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    pub status: Option<PostStatus>,
}

/// Query string of `GET /api/posts/search`.
#[derive(Debug, Deserialize)]
pub struct PostSearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

impl From<PostSearchQuery> for PostFilter {
    fn from(query: PostSearchQuery) -> Self {
        Self {
            search: query.q,
            category: query.category,
            tag: query.tag,
            ..Self::published()
        }
    }
}

/// One page of post summaries.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<PostSummary>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub search_term: Option<String>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_posts: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostCreated {
    pub id: i32,
    pub slug: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: PostStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub message: String,
}
