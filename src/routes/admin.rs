//! Admin and moderation console.
//!
//! Every handler takes an [`AdminUser`] or [`ModeratorUser`], so role checks
//! happen during extraction, before the handler body runs.

use std::collections::HashMap;

use crate::{
    auth::{AdminUser, ModeratorUser},
    db::{slug_exists, SlugTable},
    error::AppError,
    models::{
        post::POST_COUNT_SELECT, AdminComment, AdminPostPage, AdminPostRow, Category,
        CategoryInput, CommentPage, Dashboard, DashboardStats, PageParams, PostFilter,
        PostListQuery, RecentComment, RecentPost, RoleUpdate, StatusUpdate, User, UserPage,
    },
    slug::normalize,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

const USERS_PER_PAGE: i64 = 10;
const POSTS_PER_PAGE: i64 = 10;
const COMMENTS_PER_PAGE: i64 = 20;
const RECENT_ITEMS: i64 = 5;

async fn count(pool: &PgPool, sql: &'static str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await
}

#[get("/dashboard")]
pub async fn dashboard(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    let pool = pool.get_ref();

    let (total_users, total_posts, total_comments, total_categories) = tokio::try_join!(
        count(pool, "SELECT COUNT(*) FROM users"),
        count(pool, "SELECT COUNT(*) FROM posts"),
        count(pool, "SELECT COUNT(*) FROM comments"),
        count(pool, "SELECT COUNT(*) FROM categories"),
    )?;

    let by_status = sqlx::query_as::<_, (String, i64)>(
        "SELECT status::TEXT, COUNT(*) FROM posts GROUP BY status",
    )
    .fetch_all(pool)
    .await?;

    let recent_posts = sqlx::query_as::<_, RecentPost>(
        "SELECT p.id, p.title, p.slug, p.status, p.created_at, u.username AS author \
         FROM posts p LEFT JOIN users u ON p.user_id = u.id \
         ORDER BY p.created_at DESC LIMIT $1",
    )
    .bind(RECENT_ITEMS)
    .fetch_all(pool)
    .await?;

    let recent_comments = sqlx::query_as::<_, RecentComment>(
        "SELECT c.id, c.content, c.created_at, u.username AS author, p.title AS post_title \
         FROM comments c \
         LEFT JOIN users u ON c.user_id = u.id \
         LEFT JOIN posts p ON c.post_id = p.id \
         ORDER BY c.created_at DESC LIMIT $1",
    )
    .bind(RECENT_ITEMS)
    .fetch_all(pool)
    .await?;

    Ok(HttpResponse::Ok().json(Dashboard {
        stats: DashboardStats {
            total_users,
            total_posts,
            total_comments,
            total_categories,
            posts_by_status: by_status.into_iter().collect::<HashMap<_, _>>(),
        },
        recent_posts,
        recent_comments,
    }))
}

#[get("/users")]
pub async fn list_users(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    page: web::Query<PageParams>,
) -> Result<impl Responder, AppError> {
    let pagination = page.resolve(USERS_PER_PAGE);

    let total = count(&pool, "SELECT COUNT(*) FROM users").await?;
    let users = sqlx::query_as::<_, User>(
        "SELECT id, username, email, role, avatar, bio, created_at FROM users \
         ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
    )
    .bind(pagination.limit)
    .bind(pagination.offset())
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(UserPage {
        users,
        current_page: pagination.page,
        total_pages: pagination.total_pages(total),
        total_users: total,
    }))
}

#[put("/users/{id}/role")]
pub async fn update_user_role(
    pool: web::Data<PgPool>,
    AdminUser(admin): AdminUser,
    id: web::Path<i32>,
    update: web::Json<RoleUpdate>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();
    if id == admin.id {
        return Err(AppError::BadRequest("Cannot change your own role".into()));
    }

    let updated = sqlx::query("UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2")
        .bind(update.role)
        .bind(id)
        .execute(&**pool)
        .await?
        .rows_affected();
    if updated == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    log::info!(
        "Admin {} set role of user {} to {}",
        admin.id,
        id,
        update.role.as_str()
    );
    Ok(HttpResponse::Ok().json(json!({ "message": "User role updated successfully" })))
}

/// Deletes an account together with its posts, comments and likes.
#[delete("/users/{id}")]
pub async fn delete_user(
    pool: web::Data<PgPool>,
    AdminUser(admin): AdminUser,
    id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();
    if id == admin.id {
        return Err(AppError::BadRequest("Cannot delete your own account".into()));
    }

    let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&**pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    log::info!("Admin {} deleted user {}", admin.id, id);
    Ok(HttpResponse::Ok().json(json!({ "message": "User deleted successfully" })))
}

#[delete("/posts/{id}")]
pub async fn delete_any_post(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id.into_inner())
        .execute(&**pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound("Post not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Post deleted successfully" })))
}

/// Creates a category whose slug is the normalized name.
#[post("/categories")]
pub async fn create_category(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    input: web::Json<CategoryInput>,
) -> Result<impl Responder, AppError> {
    input.validate()?;

    let slug = normalize(&input.name);
    if slug.is_empty() {
        return Err(AppError::ValidationError(
            "Category name must contain letters or digits".into(),
        ));
    }
    if slug_exists(&pool, SlugTable::Categories, &slug, None).await? {
        return Err(AppError::BadRequest("Category already exists".into()));
    }

    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, slug, description) VALUES ($1, $2, $3) \
         ON CONFLICT (slug) DO NOTHING \
         RETURNING id, name, slug, description, created_at",
    )
    .bind(input.name.trim())
    .bind(&slug)
    .bind(&input.description)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::BadRequest("Category already exists".into()))?;

    Ok(HttpResponse::Created().json(category))
}

/// Renames a category or changes its description. The slug is kept so that
/// existing links stay valid.
#[put("/categories/{id}")]
pub async fn update_category(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    id: web::Path<i32>,
    input: web::Json<CategoryInput>,
) -> Result<impl Responder, AppError> {
    input.validate()?;

    let category = sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = $1, description = $2 WHERE id = $3 \
         RETURNING id, name, slug, description, created_at",
    )
    .bind(input.name.trim())
    .bind(&input.description)
    .bind(id.into_inner())
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Category not found".into()))?;

    Ok(HttpResponse::Ok().json(category))
}

#[delete("/categories/{id}")]
pub async fn delete_category(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();

    let in_use =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM posts WHERE category_id = $1)")
            .bind(id)
            .fetch_one(&**pool)
            .await?;
    if in_use {
        return Err(AppError::BadRequest(
            "Cannot delete category with existing posts".into(),
        ));
    }

    let deleted = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&**pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound("Category not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Category deleted successfully" })))
}

/// Posts of every status, optionally narrowed to one.
#[get("/posts")]
pub async fn list_all_posts(
    pool: web::Data<PgPool>,
    _moderator: ModeratorUser,
    query: web::Query<PostListQuery>,
    page: web::Query<PageParams>,
) -> Result<impl Responder, AppError> {
    let pagination = page.resolve(POSTS_PER_PAGE);
    let filter = PostFilter {
        status: query.status,
        ..PostFilter::default()
    };

    let mut count_query = QueryBuilder::<Postgres>::new(POST_COUNT_SELECT);
    filter.push_where(&mut count_query);
    let total: i64 = count_query.build_query_scalar().fetch_one(&**pool).await?;

    let mut select = QueryBuilder::<Postgres>::new(
        "SELECT p.id, p.title, p.slug, p.status, p.views, p.created_at, \
         u.username AS author, c.name AS category_name \
         FROM posts p \
         LEFT JOIN users u ON p.user_id = u.id \
         LEFT JOIN categories c ON p.category_id = c.id",
    );
    filter.push_where(&mut select);
    select
        .push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
        .push_bind(pagination.limit)
        .push(" OFFSET ")
        .push_bind(pagination.offset());
    let posts = select
        .build_query_as::<AdminPostRow>()
        .fetch_all(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(AdminPostPage {
        posts,
        current_page: pagination.page,
        total_pages: pagination.total_pages(total),
        total_posts: total,
    }))
}

#[put("/posts/{id}/status")]
pub async fn update_post_status(
    pool: web::Data<PgPool>,
    ModeratorUser(moderator): ModeratorUser,
    id: web::Path<i32>,
    update: web::Json<StatusUpdate>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();

    let updated = sqlx::query("UPDATE posts SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(update.status)
        .bind(id)
        .execute(&**pool)
        .await?
        .rows_affected();
    if updated == 0 {
        return Err(AppError::NotFound("Post not found".into()));
    }

    log::info!(
        "User {} set status of post {} to {}",
        moderator.id,
        id,
        update.status.as_str()
    );
    Ok(HttpResponse::Ok().json(json!({ "message": "Post status updated successfully" })))
}

#[get("/comments")]
pub async fn list_all_comments(
    pool: web::Data<PgPool>,
    _moderator: ModeratorUser,
    page: web::Query<PageParams>,
) -> Result<impl Responder, AppError> {
    let pagination = page.resolve(COMMENTS_PER_PAGE);

    let total = count(&pool, "SELECT COUNT(*) FROM comments").await?;
    let comments = sqlx::query_as::<_, AdminComment>(
        "SELECT c.id, c.content, c.created_at, u.username AS author, \
         p.title AS post_title, p.slug AS post_slug \
         FROM comments c \
         LEFT JOIN users u ON c.user_id = u.id \
         LEFT JOIN posts p ON c.post_id = p.id \
         ORDER BY c.created_at DESC, c.id DESC LIMIT $1 OFFSET $2",
    )
    .bind(pagination.limit)
    .bind(pagination.offset())
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(CommentPage {
        comments,
        current_page: pagination.page,
        total_pages: pagination.total_pages(total),
        total_comments: total,
    }))
}

#[delete("/comments/{id}")]
pub async fn delete_any_comment(
    pool: web::Data<PgPool>,
    _moderator: ModeratorUser,
    id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let deleted = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id.into_inner())
        .execute(&**pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound("Comment not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Comment deleted successfully" })))
}
