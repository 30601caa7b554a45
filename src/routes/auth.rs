use crate::{
    auth::{
        generate_token, hash_password, verify_password, AuthResponse, AuthenticatedUser,
        LoginRequest, RegisterRequest,
    },
    error::AppError,
    models::{ChangePasswordRequest, Role, UpdateProfileRequest, User, UserStats},
};
use actix_web::{get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use validator::Validate;

#[derive(FromRow)]
struct Credentials {
    id: i32,
    username: String,
    email: String,
    role: Role,
    password_hash: String,
}

/// Register a new user
///
/// Creates an account with the `user` role and returns an authentication token.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 OR username = $2)",
    )
    .bind(&register_data.email)
    .bind(&register_data.username)
    .fetch_one(&**pool)
    .await?;

    if taken {
        return Err(AppError::BadRequest("User already exists".into()));
    }

    let password_hash = hash_password(&register_data.password)?;

    let id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO users (username, email, password_hash, role) \
         VALUES ($1, $2, $3, 'user') RETURNING id",
    )
    .bind(&register_data.username)
    .bind(&register_data.email)
    .bind(&password_hash)
    .fetch_one(&**pool)
    .await
    .map_err(user_exists_on_conflict)?;

    log::info!("Registered user {} ({})", id, register_data.username);
    let token = generate_token(id)?;
    let RegisterRequest {
        username, email, ..
    } = register_data.into_inner();

    Ok(HttpResponse::Created().json(AuthResponse {
        id,
        username,
        email,
        role: Role::User,
        token,
    }))
}

/// A concurrent registration can pass the existence check and still lose
/// the race on the unique email or username index.
fn user_exists_on_conflict(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::BadRequest("User already exists".into());
        }
    }
    err.into()
}

/// Login user
///
/// Authenticates a user and returns an authentication token.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = sqlx::query_as::<_, Credentials>(
        "SELECT id, username, email, role, password_hash FROM users WHERE email = $1",
    )
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    match user {
        Some(user) if verify_password(&login_data.password, &user.password_hash)? => {
            let token = generate_token(user.id)?;
            Ok(HttpResponse::Ok().json(AuthResponse {
                id: user.id,
                username: user.username,
                email: user.email,
                role: user.role,
                token,
            }))
        }
        _ => Err(AppError::Unauthorized("Invalid credentials".into())),
    }
}

#[get("/profile")]
pub async fn get_profile(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let profile = fetch_user(&pool, user.id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// Update the caller's username, bio or avatar.
///
/// Only fields present in the payload are written; an empty `bio` or `avatar`
/// clears it.
#[put("/profile")]
pub async fn update_profile(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    update: web::Json<UpdateProfileRequest>,
) -> Result<impl Responder, AppError> {
    update.validate()?;

    if let Some(username) = &update.username {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND id <> $2)",
        )
        .bind(username)
        .bind(user.id)
        .fetch_one(&**pool)
        .await?;

        if taken {
            return Err(AppError::BadRequest("Username already taken".into()));
        }
    }

    if !update.is_empty() {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE users SET ");
        let mut fields = builder.separated(", ");
        if let Some(username) = &update.username {
            fields.push("username = ").push_bind_unseparated(username.clone());
        }
        if let Some(bio) = &update.bio {
            fields.push("bio = ").push_bind_unseparated(non_empty(bio));
        }
        if let Some(avatar) = &update.avatar {
            fields.push("avatar = ").push_bind_unseparated(non_empty(avatar));
        }
        builder.push(", updated_at = NOW() WHERE id = ").push_bind(user.id);
        builder.build().execute(&**pool).await?;
    }

    let profile = fetch_user(&pool, user.id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[put("/change-password")]
pub async fn change_password(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    request: web::Json<ChangePasswordRequest>,
) -> Result<impl Responder, AppError> {
    request.validate()?;

    let current_hash =
        sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
            .bind(user.id)
            .fetch_optional(&**pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if !verify_password(&request.current_password, &current_hash)? {
        return Err(AppError::Unauthorized("Current password is incorrect".into()));
    }

    let new_hash = hash_password(&request.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(&new_hash)
        .bind(user.id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Password changed successfully" })))
}

/// Activity totals for the caller's own posts.
#[get("/stats")]
pub async fn stats(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let stats = sqlx::query_as::<_, (i64, i64, i64, i64)>(
        "SELECT \
           (SELECT COUNT(*) FROM posts WHERE user_id = $1), \
           (SELECT COUNT(*) FROM comments WHERE user_id = $1), \
           (SELECT COUNT(*) FROM post_likes pl JOIN posts p ON pl.post_id = p.id WHERE p.user_id = $1), \
           (SELECT COALESCE(SUM(views), 0)::BIGINT FROM posts WHERE user_id = $1)",
    )
    .bind(user.id)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(UserStats {
        total_posts: stats.0,
        total_comments: stats.1,
        total_likes_received: stats.2,
        total_views: stats.3,
    }))
}

async fn fetch_user(pool: &PgPool, id: i32) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, role, avatar, bio, created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
