#![allow(dead_code)]

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Once;

use blogforge::auth::AuthMiddleware;
use blogforge::routes::{self, health};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

static ENV: Once = Once::new();

/// Loads `.env` and pins the token secret shared by every test in the binary.
pub fn init_env() {
    ENV.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var("JWT_SECRET", TEST_JWT_SECRET);
    });
}

/// A pool that never connects unless a query is actually run.
pub fn lazy_pool() -> PgPool {
    init_env();
    PgPoolOptions::new()
        .connect_lazy("postgres://postgres@localhost/blogforge_unused")
        .expect("lazy pool")
}

/// Connects to `DATABASE_URL` and applies the migrations.
pub async fn live_pool() -> PgPool {
    init_env();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// The application as the server binary assembles it.
pub async fn init_app(
    pool: PgPool,
) -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(pool))
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .service(health::health)
            .service(health::index)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await
}

/// Sends a request and returns its status with the JSON body (`Null` if empty or not JSON).
pub async fn send(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    req: test::TestRequest,
) -> (u16, Value) {
    match test::try_call_service(app, req.to_request()).await {
        Ok(resp) => {
            let status = resp.status().as_u16();
            let body = test::read_body(resp).await;
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status().as_u16();
            let body = actix_web::body::to_bytes(resp.into_body())
                .await
                .unwrap_or_default();
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Registers an account and returns `(id, token)`.
pub async fn register(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    username: &str,
    email: &str,
) -> (i32, String) {
    let (status, body) = send(
        app,
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": username,
                "email": email,
                "password": "Password123!"
            })),
    )
    .await;
    assert_eq!(status, 201, "register {}: {}", username, body);
    (
        body["id"].as_i64().expect("id") as i32,
        body["token"].as_str().expect("token").to_string(),
    )
}

pub async fn cleanup_users(pool: &PgPool, emails: &[&str]) {
    for email in emails {
        let _ = sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(email)
            .execute(pool)
            .await;
    }
}
