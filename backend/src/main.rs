use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use dustcheck_backend::inference::load_model;
use dustcheck_backend::remote::ImageFetcher;
use dustcheck_backend::{AppState, ServiceConfig, configure_routes};
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    }

    let config = ServiceConfig::load().map_err(|e| {
        log::error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // A missing or broken model keeps the server up; inference routes answer 500.
    let model = match load_model(&config.model_path, config.input_size()) {
        Ok(model) => {
            log::info!("Model loaded successfully from {}", config.model_path.display());
            Some(model)
        }
        Err(e) => {
            log::error!("Error loading model: {}", e);
            None
        }
    };

    let fetcher = ImageFetcher::new(config.download_timeout(), config.max_image_bytes)
        .map_err(|e| std::io::Error::other(format!("HTTP client setup failed: {}", e)))?;
    let state = web::Data::new(AppState::new(model, fetcher, config.max_image_bytes));

    let bind_address = config.bind_address();
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
