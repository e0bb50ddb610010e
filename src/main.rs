use actix_files::Files;
use actix_web::{web, HttpServer};
use error_stack::{Result, ResultExt};
use thiserror::Error;
use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use inkpost::{config, http, App};

#[derive(Debug, Error)]
#[error("Failed to start inkpost server")]
struct StartError;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(ErrorLayer::default())
        .init();
}

async fn run() -> Result<(), StartError> {
    let config = config::Server::load().change_context(StartError)?;
    let addr = (config.ip, config.port);
    let uploads_dir = config.uploads_dir.clone();

    tokio::fs::create_dir_all(&uploads_dir)
        .await
        .change_context(StartError)
        .attach_printable("could not create uploads directory")?;

    let app = App::new(config).await.change_context(StartError)?;
    app.primary_db
        .migrate()
        .await
        .change_context(StartError)?;

    let app = web::Data::new(app);
    tracing::info!("Listening on {}:{}", addr.0, addr.1);

    HttpServer::new(move || {
        actix_web::App::new()
            .app_data(app.clone())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(http::controllers::configure)
            .service(Files::new("/api/uploads", uploads_dir.clone()))
            .default_service(web::route().to(http::controllers::not_found))
    })
    .bind(addr)
    .change_context(StartError)?
    .run()
    .await
    .change_context(StartError)
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(error) = run().await {
        eprintln!("{error:?}");
        std::process::exit(1);
    }
}
