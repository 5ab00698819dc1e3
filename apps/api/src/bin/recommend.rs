//! One-shot recommendation: reads a request payload, prints the ranked outfits as JSON.

use clap::Parser;
use outfit_recommender_api::{
    app::build_recommendation_service, models::RecommendationRequest, ApiError, Config, Result,
};
use serde_json::json;
use std::{io::Read, path::PathBuf, process::ExitCode};
use tracing::error;

#[derive(Parser, Debug)]
#[command(
    name = "recommend",
    about = "Rank catalog outfits for a single recommendation request",
    version
)]
struct Cli {
    /// Request payload as JSON; read from stdin when omitted
    payload: Option<String>,
    /// Serve candidates from a JSON catalog file instead of MongoDB
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    // stdout carries the result only
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "outfit_recommender_api=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Recommendation failed: {}", e);
            println!("{}", json!({ "error": e.to_string() }));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<String> {
    let payload = match cli.payload {
        Some(payload) => payload,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let request: RecommendationRequest = serde_json::from_str(&payload)
        .map_err(|e| ApiError::InvalidInput(format!("Invalid request payload: {}", e)))?;
    request.validate()?;

    let mut config = Config::from_sources()?;
    if cli.catalog.is_some() {
        config.catalog_path = cli.catalog;
    }
    config.validate()?;

    let service = build_recommendation_service(&config)?;
    let recommendations = service
        .rank(&request.user_profile, &request.preferences)
        .await?;

    Ok(serde_json::to_string(&recommendations)?)
}
