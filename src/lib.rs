#[macro_use]
extern crate rocket;

pub mod api;
pub mod cache;
pub mod config;
pub mod cors;
pub mod generation;
pub mod params;

use rocket::fairing::AdHoc;
use rocket::{Build, Rocket};

use cors::CORS;
use generation::ImageGenerator;

/// Attach the generator, its startup fairings and the txt2img routes.
pub fn mount(rocket: Rocket<Build>, generator: ImageGenerator) -> Rocket<Build> {
    rocket
        .attach(CORS)
        .attach(AdHoc::try_on_ignite("Cache directory", |rocket| async move {
            let store = rocket
                .state::<ImageGenerator>()
                .map(|generator| generator.store().clone());

            let Some(store) = store else {
                log::error!("Image generator is not managed");
                return Err(rocket);
            };

            match store.ensure_root().await {
                Ok(()) => {
                    log::info!("Caching artifacts in {}", store.root().display());
                    Ok(rocket)
                }
                Err(e) => {
                    log::error!("Could not create cache directory: {}", e);
                    Err(rocket)
                }
            }
        }))
        .manage(generator)
        .mount(
            "/",
            routes![
                api::txt2img::txt2img,
                api::txt2img::txt2img_overescaped,
                cors::preflight,
            ],
        )
}
