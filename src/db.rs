//! Persistence lookups shared by several route modules.

use sqlx::{PgConnection, PgPool};

use crate::error::AppError;
use crate::models::Tag;
use crate::slug::{resolve_unique, smart_slugify};

/// Slug used when normalization leaves nothing of the source text.
pub const FALLBACK_SLUG: &str = "post";

/// Tables whose rows are addressed by slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugTable {
    Posts,
    Categories,
}

impl SlugTable {
    fn exists_query(self) -> &'static str {
        match self {
            SlugTable::Posts => {
                "SELECT EXISTS(SELECT 1 FROM posts WHERE slug = $1 AND ($2::INT IS NULL OR id <> $2))"
            }
            SlugTable::Categories => {
                "SELECT EXISTS(SELECT 1 FROM categories WHERE slug = $1 AND ($2::INT IS NULL OR id <> $2))"
            }
        }
    }
}

/// Whether `slug` is used by any row of `table` other than `exclude_id`.
pub async fn slug_exists(
    pool: &PgPool,
    table: SlugTable,
    slug: &str,
    exclude_id: Option<i32>,
) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>(table.exists_query())
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Turns a candidate into the slug a post will be stored under: empty
/// candidates fall back to [`FALLBACK_SLUG`], taken ones get a disambiguator.
pub async fn unique_post_slug(
    pool: &PgPool,
    candidate: String,
    exclude_id: Option<i32>,
) -> Result<String, AppError> {
    let candidate = if candidate.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        candidate
    };

    resolve_unique(candidate, |slug| async move {
        slug_exists(pool, SlugTable::Posts, &slug, exclude_id).await
    })
    .await
}

/// Returns the tag whose slug is derived from `name`, creating it if needed.
///
/// Names that slugify to nothing are skipped. The upsert keeps concurrent
/// writers from failing on the unique slug index.
pub async fn find_or_create_tag(
    conn: &mut PgConnection,
    name: &str,
    transliterate: bool,
) -> Result<Option<Tag>, AppError> {
    let name = name.trim();
    let slug = smart_slugify(name, transliterate);
    if slug.is_empty() {
        log::debug!("Skipping tag '{}' with empty slug", name);
        return Ok(None);
    }

    let tag = sqlx::query_as::<_, Tag>(
        "INSERT INTO tags (name, slug) VALUES ($1, $2) \
         ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug \
         RETURNING id, name, slug",
    )
    .bind(name)
    .bind(&slug)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Some(tag))
}

/// Replaces the tag links of a post with the tags named in `names`.
pub async fn set_post_tags(
    conn: &mut PgConnection,
    post_id: i32,
    names: &[String],
    transliterate: bool,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

    for name in names {
        if let Some(tag) = find_or_create_tag(conn, name, transliterate).await? {
            sqlx::query(
                "INSERT INTO post_tags (post_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(post_id)
            .bind(tag.id)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(())
}

pub async fn tags_of_post(pool: &PgPool, post_id: i32) -> Result<Vec<Tag>, AppError> {
    let tags = sqlx::query_as::<_, Tag>(
        "SELECT t.id, t.name, t.slug FROM tags t \
         JOIN post_tags pt ON t.id = pt.tag_id \
         WHERE pt.post_id = $1 ORDER BY t.name",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exists_queries_target_their_table() {
        assert!(SlugTable::Posts.exists_query().contains("FROM posts "));
        assert!(SlugTable::Categories
            .exists_query()
            .contains("FROM categories "));
        for table in [SlugTable::Posts, SlugTable::Categories] {
            assert!(table.exists_query().contains("$2::INT IS NULL OR id <> $2"));
        }
    }
}
