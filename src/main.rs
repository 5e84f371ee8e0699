use actix_web::{web, App, HttpServer, middleware::Logger};
use actix_governor::{Governor, GovernorConfigBuilder};
use dotenv::dotenv;
use log::{info, error, warn};

mod assistant;
mod config;
mod dataset;
mod filter;
mod gemini;
mod logging;
mod render;
mod routes;
mod utils;

use assistant::RecipeAssistant;
use config::Settings;
use gemini::GeminiClient;
use routes::HomeData;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return Ok(());
        }
    };

    if let Err(e) = logging::setup_logging(settings.log_level) {
        eprintln!("Failed to set up logging: {}", e);
        return Ok(());
    }

    utils::log_environment_variables();

    // A missing dataset only takes down the Home view.
    let home = match dataset::load(&settings.dataset_path) {
        Ok(dataset) => {
            if dataset.is_empty() {
                warn!("Dataset {} has no rows", settings.dataset_path.display());
            }
            HomeData::Ready(dataset)
        }
        Err(e) => {
            error!("Failed to load {}: {}", settings.dataset_path.display(), e);
            HomeData::Unavailable(e.to_string())
        }
    };
    let home = web::Data::new(home);

    let backend = match GeminiClient::new(&settings.gemini) {
        Ok(backend) => backend,
        Err(e) => {
            error!("Failed to build Gemini client: {}", e);
            return Ok(());
        }
    };
    let assistant = web::Data::new(RecipeAssistant::new(backend));

    info!("Starting HungerHub server on {}", settings.bind_addr);

    let governor_config = match GovernorConfigBuilder::default()
        .per_second(5)
        .burst_size(10)
        .finish()
    {
        Some(config) => config,
        None => {
            error!("Invalid rate limit configuration");
            return Ok(());
        }
    };

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Governor::new(&governor_config))
            .app_data(home.clone())
            .app_data(assistant.clone())
            .configure(routes::configure::<GeminiClient>)
    })
    .bind(&settings.bind_addr)?
    .run()
    .await
}
