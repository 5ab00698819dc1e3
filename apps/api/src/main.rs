use log::info;
use outfit_recommender_api::{app::Application, Config, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // Default to info level if RUST_LOG is not set
                "outfit_recommender_api=info,actix_web=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Loading configuration...");
    let config = Config::load()?;

    let application = Application::new(&config);
    application.run().await
}
