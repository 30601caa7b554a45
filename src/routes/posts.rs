use crate::{
    auth::AuthenticatedUser,
    db::{set_post_tags, tags_of_post, unique_post_slug},
    error::AppError,
    models::{
        post::{POST_COUNT_SELECT, POST_SUMMARY_SELECT},
        LikeResponse, PageParams, Pagination, PostCreated, PostDetail, PostFilter, PostInput,
        PostListQuery, PostPage, PostSearchQuery, PostStatus, PostSummary,
    },
    slug::{normalize, smart_slugify},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

/// Default page size of post listings.
pub const POSTS_PER_PAGE: i64 = 10;

/// Fetches one page of post summaries matching `filter`, newest first,
/// together with the total number of matches.
pub(crate) async fn fetch_post_page(
    pool: &PgPool,
    filter: &PostFilter,
    pagination: Pagination,
) -> Result<(Vec<PostSummary>, i64), AppError> {
    let mut count = QueryBuilder::<Postgres>::new(POST_COUNT_SELECT);
    filter.push_where(&mut count);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Postgres>::new(POST_SUMMARY_SELECT);
    filter.push_where(&mut select);
    select
        .push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
        .push_bind(pagination.limit)
        .push(" OFFSET ")
        .push_bind(pagination.offset());
    let posts = select
        .build_query_as::<PostSummary>()
        .fetch_all(pool)
        .await?;

    Ok((posts, total))
}

async fn ensure_category(pool: &PgPool, category_id: Option<i32>) -> Result<(), AppError> {
    let Some(category_id) = category_id else {
        return Ok(());
    };
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(category_id)
            .fetch_one(pool)
            .await?;
    if !exists {
        return Err(AppError::BadRequest("Category does not exist".into()));
    }
    Ok(())
}

/// Lists posts with the given status (`published` unless `?status=` says otherwise).
#[get("")]
pub async fn list_posts(
    pool: web::Data<PgPool>,
    query: web::Query<PostListQuery>,
    page: web::Query<PageParams>,
) -> Result<impl Responder, AppError> {
    let pagination = page.resolve(POSTS_PER_PAGE);
    let filter = PostFilter {
        status: Some(query.status.unwrap_or(PostStatus::Published)),
        ..PostFilter::default()
    };

    let (posts, total) = fetch_post_page(&pool, &filter, pagination).await?;

    Ok(HttpResponse::Ok().json(PostPage {
        posts,
        search_term: None,
        current_page: pagination.page,
        total_pages: pagination.total_pages(total),
        total_posts: total,
    }))
}

/// Searches published posts by text, category slug and tag slug.
#[get("/search")]
pub async fn search_posts(
    pool: web::Data<PgPool>,
    query: web::Query<PostSearchQuery>,
    page: web::Query<PageParams>,
) -> Result<impl Responder, AppError> {
    let pagination = page.resolve(POSTS_PER_PAGE);
    let filter = PostFilter::from(query.into_inner());

    let (posts, total) = fetch_post_page(&pool, &filter, pagination).await?;

    Ok(HttpResponse::Ok().json(PostPage {
        posts,
        search_term: filter.search,
        current_page: pagination.page,
        total_pages: pagination.total_pages(total),
        total_posts: total,
    }))
}

/// Creates a post owned by the caller.
///
/// The slug comes from `custom_slug` when given, otherwise from the title,
/// and is made unique among posts. Tags are created on first use.
#[post("")]
pub async fn create_post(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    post: web::Json<PostInput>,
) -> Result<impl Responder, AppError> {
    post.validate()?;
    ensure_category(&pool, post.category_id).await?;

    let candidate = match post.slug_override() {
        Some(custom) => normalize(custom),
        None => smart_slugify(&post.title, post.transliterate_slug),
    };
    let slug = unique_post_slug(&pool, candidate, None).await?;

    let mut tx = pool.begin().await?;
    let id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO posts (title, slug, content, excerpt, featured_image, meta_description, \
         focus_keyword, user_id, category_id, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
    )
    .bind(post.title.trim())
    .bind(&slug)
    .bind(&post.content)
    .bind(&post.excerpt)
    .bind(&post.featured_image)
    .bind(&post.meta_description)
    .bind(&post.focus_keyword)
    .bind(user.id)
    .bind(post.category_id)
    .bind(post.status.unwrap_or(PostStatus::Draft))
    .fetch_one(&mut *tx)
    .await?;

    if let Some(tags) = &post.tags {
        set_post_tags(&mut *tx, id, tags, post.transliterate_slug).await?;
    }
    tx.commit().await?;

    log::info!("User {} created post {} with slug '{}'", user.id, id, slug);
    Ok(HttpResponse::Created().json(PostCreated {
        id,
        slug,
        message: "Post created successfully".into(),
    }))
}

/// Returns a post with its author, category and tags, and counts the view.
#[get("/{slug}")]
pub async fn get_post(
    pool: web::Data<PgPool>,
    slug: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let slug = slug.into_inner();

    let mut detail = sqlx::query_as::<_, PostDetail>(
        "SELECT p.*, u.username, u.avatar, u.bio, \
         c.name AS category_name, c.slug AS category_slug \
         FROM posts p \
         LEFT JOIN users u ON p.user_id = u.id \
         LEFT JOIN categories c ON p.category_id = c.id \
         WHERE p.slug = $1 ORDER BY p.id LIMIT 1",
    )
    .bind(&slug)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Post not found".into()))?;

    detail.post.views = sqlx::query_scalar::<_, i32>(
        "UPDATE posts SET views = views + 1 WHERE id = $1 RETURNING views",
    )
    .bind(detail.post.id)
    .fetch_one(&**pool)
    .await?;

    detail.tags = tags_of_post(&pool, detail.post.id).await?;

    Ok(HttpResponse::Ok().json(detail))
}

#[derive(sqlx::FromRow)]
struct PostOwnership {
    user_id: i32,
    title: String,
    slug: String,
}

/// Loads a post for a write by `user_id`; 404 if missing, 403 if someone else's.
async fn owned_post(
    pool: &PgPool,
    id: i32,
    user_id: i32,
    action: &str,
) -> Result<PostOwnership, AppError> {
    let post =
        sqlx::query_as::<_, PostOwnership>("SELECT user_id, title, slug FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".into()))?;

    if post.user_id != user_id {
        return Err(AppError::Forbidden(format!(
            "Not authorized to {} this post",
            action
        )));
    }
    Ok(post)
}

/// Updates a post owned by the caller.
///
/// The slug is recomputed when `custom_slug` is given or the title changed;
/// the post's own slug never counts as a collision. A `tags` list replaces the
/// current tags, an absent one keeps them.
#[put("/{id}")]
pub async fn update_post(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    id: web::Path<i32>,
    post: web::Json<PostInput>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();
    post.validate()?;

    let current = owned_post(&pool, id, user.id, "update").await?;
    ensure_category(&pool, post.category_id).await?;

    let slug = match post.slug_override() {
        Some(custom) => unique_post_slug(&pool, normalize(custom), Some(id)).await?,
        None if post.title.trim() != current.title => {
            let candidate = smart_slugify(&post.title, post.transliterate_slug);
            unique_post_slug(&pool, candidate, Some(id)).await?
        }
        None => current.slug,
    };

    let mut tx = pool.begin().await?;
    sqlx::query(
        "UPDATE posts SET title = $1, slug = $2, content = $3, excerpt = $4, \
         featured_image = $5, meta_description = $6, focus_keyword = $7, \
         category_id = $8, status = COALESCE($9, status), updated_at = NOW() \
         WHERE id = $10",
    )
    .bind(post.title.trim())
    .bind(&slug)
    .bind(&post.content)
    .bind(&post.excerpt)
    .bind(&post.featured_image)
    .bind(&post.meta_description)
    .bind(&post.focus_keyword)
    .bind(post.category_id)
    .bind(post.status)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if let Some(tags) = &post.tags {
        set_post_tags(&mut *tx, id, tags, post.transliterate_slug).await?;
    }
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Post updated successfully",
        "slug": slug
    })))
}

#[delete("/{id}")]
pub async fn delete_post(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();
    owned_post(&pool, id, user.id, "delete").await?;

    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(&**pool)
        .await?;

    log::info!("User {} deleted post {}", user.id, id);
    Ok(HttpResponse::Ok().json(json!({ "message": "Post deleted successfully" })))
}

/// Likes the post, or removes the caller's like if there already is one.
#[post("/{id}/like")]
pub async fn toggle_like(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
        .bind(id)
        .fetch_one(&**pool)
        .await?;
    if !exists {
        return Err(AppError::NotFound("Post not found".into()));
    }

    let removed = sqlx::query("DELETE FROM post_likes WHERE user_id = $1 AND post_id = $2")
        .bind(user.id)
        .bind(id)
        .execute(&**pool)
        .await?
        .rows_affected();

    if removed > 0 {
        return Ok(HttpResponse::Ok().json(LikeResponse {
            liked: false,
            message: "Post unliked".into(),
        }));
    }

    sqlx::query(
        "INSERT INTO post_likes (user_id, post_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user.id)
    .bind(id)
    .execute(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(LikeResponse {
        liked: true,
        message: "Post liked".into(),
    }))
}
