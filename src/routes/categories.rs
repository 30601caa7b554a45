use crate::{
    error::AppError,
    models::{Category, CategoryPosts, CategoryWithCount, PageParams, PostFilter},
    routes::posts::{fetch_post_page, POSTS_PER_PAGE},
};
use actix_web::{get, web, HttpResponse, Responder};
use sqlx::PgPool;

/// All categories by name, each with its number of published posts.
#[get("")]
pub async fn list_categories(pool: web::Data<PgPool>) -> Result<impl Responder, AppError> {
    let categories = sqlx::query_as::<_, CategoryWithCount>(
        "SELECT c.id, c.name, c.slug, c.description, c.created_at, \
         COUNT(p.id) AS post_count \
         FROM categories c \
         LEFT JOIN posts p ON p.category_id = c.id AND p.status = 'published' \
         GROUP BY c.id \
         ORDER BY c.name ASC",
    )
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(categories))
}

#[get("/{slug}/posts")]
pub async fn category_posts(
    pool: web::Data<PgPool>,
    slug: web::Path<String>,
    page: web::Query<PageParams>,
) -> Result<impl Responder, AppError> {
    let slug = slug.into_inner();
    let pagination = page.resolve(POSTS_PER_PAGE);

    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, slug, description, created_at FROM categories WHERE slug = $1",
    )
    .bind(&slug)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Category not found".into()))?;

    let filter = PostFilter {
        category: Some(category.slug.clone()),
        ..PostFilter::published()
    };
    let (posts, total) = fetch_post_page(&pool, &filter, pagination).await?;

    Ok(HttpResponse::Ok().json(CategoryPosts {
        category,
        posts,
        current_page: pagination.page,
        total_pages: pagination.total_pages(total),
        total_posts: total,
    }))
}
