use actix_web::{web, HttpResponse};
use serde_json::json;

pub mod posts;
pub mod users;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/users")
                    .route("/signup", web::post().to(users::register::post))
                    .route("/login", web::post().to(users::login::post))
                    .route("/forgot-password", web::post().to(users::password::forgot))
                    .route("/reset-password/{token}", web::post().to(users::password::reset))
                    .route("/profile", web::get().to(users::profile::get))
                    .route("/profile", web::put().to(users::profile::put)),
            )
            .service(
                web::scope("/posts")
                    // `/stats` has to be registered before `/{id}`
                    .route("/stats", web::get().to(posts::crud::stats))
                    .route("", web::post().to(posts::crud::create))
                    .route("", web::get().to(posts::crud::list))
                    .route("/{id}", web::get().to(posts::crud::get))
                    .route("/{id}", web::put().to(posts::crud::update))
                    .route("/{id}", web::delete().to(posts::crud::delete))
                    .route("/{id}/react", web::post().to(posts::react::post))
                    .route("/{id}/comments", web::get().to(posts::comments::list))
                    .route("/{id}/comments", web::post().to(posts::comments::create))
                    .route("/{id}/comments/{cid}", web::put().to(posts::comments::update))
                    .route("/{id}/comments/{cid}", web::delete().to(posts::comments::delete))
                    .route(
                        "/{id}/comments/{cid}/replies",
                        web::get().to(posts::comments::list_replies),
                    )
                    .route(
                        "/{id}/comments/{cid}/replies",
                        web::post().to(posts::comments::add_reply),
                    ),
            ),
    );
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "message": "Route not found" }))
}
