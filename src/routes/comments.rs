use crate::{
    auth::AuthenticatedUser,
    comment_tree::{build_tree, write_json},
    error::AppError,
    models::{Comment, CommentCreated, CommentInput},
};
use actix_web::{delete, get, http::header::ContentType, post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Threaded comments of a post: top-level comments newest first, each with
/// its nested replies.
#[get("/posts/{post_id}/comments")]
pub async fn get_comments(
    pool: web::Data<PgPool>,
    post_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let flat = sqlx::query_as::<_, Comment>(
        "SELECT c.id, c.content, c.post_id, c.parent_id, c.created_at, \
         u.id AS user_id, u.username, u.avatar \
         FROM comments c \
         LEFT JOIN users u ON c.user_id = u.id \
         WHERE c.post_id = $1 \
         ORDER BY c.created_at DESC, c.id DESC",
    )
    .bind(post_id.into_inner())
    .fetch_all(&**pool)
    .await?;

    let thread = build_tree(flat);
    let body = write_json(&thread)
        .map_err(|e| AppError::InternalServerError(format!("Failed to encode comments: {}", e)))?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(body))
}

/// Adds a comment, or a reply when `parent_id` names a comment on the same post.
#[post("/posts/{post_id}/comments")]
pub async fn create_comment(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    post_id: web::Path<i32>,
    comment: web::Json<CommentInput>,
) -> Result<impl Responder, AppError> {
    let post_id = post_id.into_inner();
    comment.validate()?;

    let post_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
            .bind(post_id)
            .fetch_one(&**pool)
            .await?;
    if !post_exists {
        return Err(AppError::NotFound("Post not found".into()));
    }

    if let Some(parent_id) = comment.parent_id {
        let parent_post = sqlx::query_scalar::<_, i32>("SELECT post_id FROM comments WHERE id = $1")
            .bind(parent_id)
            .fetch_optional(&**pool)
            .await?;
        if parent_post != Some(post_id) {
            return Err(AppError::BadRequest(
                "Parent comment does not belong to this post".into(),
            ));
        }
    }

    let id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO comments (content, post_id, user_id, parent_id) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(comment.content.trim())
    .bind(post_id)
    .bind(user.id)
    .bind(comment.parent_id)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(CommentCreated {
        id,
        message: "Comment created successfully".into(),
    }))
}

/// Deletes one of the caller's comments. Replies to it are kept and become
/// unreachable from the thread.
#[delete("/{id}")]
pub async fn delete_comment(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();

    let author = sqlx::query_scalar::<_, Option<i32>>("SELECT user_id FROM comments WHERE id = $1")
        .bind(id)
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))?;

    if author != Some(user.id) {
        return Err(AppError::Forbidden(
            "Not authorized to delete this comment".into(),
        ));
    }

    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Comment deleted successfully" })))
}
