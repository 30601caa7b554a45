pub mod admin;
pub mod auth;
pub mod categories;
pub mod comments;
pub mod health;
pub mod posts;

use actix_web::web;

/// Registers the `/api` resources. `/posts/search` must precede `/posts/{slug}`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::get_profile)
            .service(auth::update_profile)
            .service(auth::change_password)
            .service(auth::stats),
    )
    .service(
        web::scope("/posts")
            .service(posts::list_posts)
            .service(posts::create_post)
            .service(posts::search_posts)
            .service(posts::get_post)
            .service(posts::update_post)
            .service(posts::delete_post)
            .service(posts::toggle_like),
    )
    .service(
        web::scope("/categories")
            .service(categories::list_categories)
            .service(categories::category_posts),
    )
    .service(
        web::scope("/comments")
            .service(comments::get_comments)
            .service(comments::create_comment)
            .service(comments::delete_comment),
    )
    .service(
        web::scope("/admin")
            .service(admin::dashboard)
            .service(admin::list_users)
            .service(admin::update_user_role)
            .service(admin::delete_user)
            .service(admin::list_all_posts)
            .service(admin::update_post_status)
            .service(admin::delete_any_post)
            .service(admin::create_category)
            .service(admin::update_category)
            .service(admin::delete_category)
            .service(admin::list_all_comments)
            .service(admin::delete_any_comment),
    );
}
