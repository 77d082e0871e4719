#[macro_use]
extern crate rocket;

use std::env;

use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};
use rocket::{
    figment::{
        providers::{Format, Toml},
        Figment, Profile,
    },
    Config,
};
use txt2img_cache::config::AppConfig;
use txt2img_cache::generation::ImageGenerator;

#[launch]
async fn rocket() -> _ {
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    // Load config
    let mut figment = Figment::from(Config::default())
        .merge(Toml::file("App.toml").nested());

    if let Ok(url) = env::var("UPSTREAM_URL") {
        figment = figment.merge(("upstream_url", url));
    }

    if let Ok(dir) = env::var("CACHE_DIR") {
        figment = figment.merge(("cache_dir", dir));
    }

    if let Ok(ext) = env::var("CACHE_FILE_EXTENSION") {
        figment = figment.merge(("cache_file_extension", ext));
    }

    figment = figment.select(Profile::from_env_or("APP_PROFILE", "default"));

    // App config
    let config = match figment.extract::<AppConfig>() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Configuration loaded successfully");

    let generator = match ImageGenerator::from_config(&config) {
        Ok(generator) => generator,
        Err(e) => {
            error!("Could not build upstream client: {}", e);
            std::process::exit(1);
        }
    };
    info!("Forwarding cache misses to {}", config.upstream_url);

    info!(
        "Starting txt2img cache on {}:{}",
        config.address, config.port
    );

    txt2img_cache::mount(rocket::custom(figment), generator)
}
