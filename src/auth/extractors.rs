use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::auth::Claims;
use crate::error::AppError;
use crate::models::Role;

/// The account behind the request's bearer token, freshly loaded from the database.
///
/// Relies on [`AuthMiddleware`](super::AuthMiddleware) having verified the
/// token. Without claims the request is rejected with 401, as it is when the
/// account has been deleted since the token was issued.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();
        let pool = req.app_data::<web::Data<PgPool>>().cloned();

        Box::pin(async move {
            let claims = claims
                .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".into()))?;
            let pool = pool.ok_or_else(|| {
                AppError::InternalServerError("Database pool not configured".into())
            })?;

            let user = sqlx::query_as::<_, AuthenticatedUser>(
                "SELECT id, username, email, role FROM users WHERE id = $1",
            )
            .bind(claims.sub)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

            Ok::<_, ActixError>(user)
        })
    }
}

/// An authenticated user with moderator or admin rights; 403 otherwise.
#[derive(Debug, Clone)]
pub struct ModeratorUser(pub AuthenticatedUser);

impl FromRequest for ModeratorUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let user = AuthenticatedUser::from_request(req, payload);
        Box::pin(async move {
            let user = user.await?;
            if !user.role.can_moderate() {
                return Err(AppError::Forbidden("Moderator or admin access required".into()).into());
            }
            Ok::<_, ActixError>(ModeratorUser(user))
        })
    }
}

/// An authenticated admin; 403 otherwise.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequest for AdminUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let user = AuthenticatedUser::from_request(req, payload);
        Box::pin(async move {
            let user = user.await?;
            if !user.role.is_admin() {
                return Err(AppError::Forbidden("Admin access required".into()).into());
            }
            Ok::<_, ActixError>(AdminUser(user))
        })
    }
}
