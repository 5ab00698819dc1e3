use crate::{
    config::Config,
    error::{ApiError, Result},
    handlers,
    ml::{FeatureExtractor, HuggingFaceImageExtractor},
    models::{
        ErrorResponse, HealthResponse, Preferences, Recommendation, RecommendationRequest,
        UserProfile,
    },
    routes::{api_routes, openapi_route, swagger_redirect_route, swagger_routes},
    services::{
        CandidateStore, InMemoryOutfitStore, MongoDataApiClient, PreferenceScorer,
        RecommendationService,
    },
};
use actix_cors::Cors;
use actix_web::{error::JsonPayloadError, middleware::Logger, web, App, HttpRequest, HttpServer};
use log::info;
use std::{net::TcpListener, sync::Arc};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::recommendations::recommend_outfits,
        handlers::health::health_check,
        handlers::prewarm::prewarm,
    ),
    components(schemas(
        RecommendationRequest,
        UserProfile,
        Preferences,
        Recommendation,
        HealthResponse,
        ErrorResponse
    )),
    tags(
        (name = "Recommendations", description = "Outfit recommendations"),
        (name = "System", description = "Health and warm-up")
    ),
    info(title = "Outfit Recommender API", version = "0.1.0")
)]
pub struct ApiDoc;

/// Wire the feature extractor and candidate store selected by `config`.
pub fn build_recommendation_service(config: &Config) -> Result<RecommendationService> {
    let extractor: Arc<dyn FeatureExtractor> =
        Arc::new(HuggingFaceImageExtractor::new(&config.huggingface)?);

    let store: Arc<dyn CandidateStore> = match &config.catalog_path {
        Some(path) => Arc::new(InMemoryOutfitStore::from_path(path)?),
        None => Arc::new(MongoDataApiClient::new(&config.mongo)?),
    };

    Ok(
        RecommendationService::new(extractor, store, PreferenceScorer::new(config.scoring.clone()))
            .with_extraction_concurrency(config.extraction_concurrency),
    )
}

/// Report malformed or incomplete request bodies as `400 {"error": ...}`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        ApiError::InvalidInput(err.to_string()).into()
    })
}

pub struct Application {
    port: u16,
    host: String,
    config: Config,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: &Config) -> Self {
        Self {
            port: config.port,
            host: config.host.clone(),
            config: config.clone(),
        }
    }

    /// Build and run the server
    pub async fn run(&self) -> Result<()> {
        let bind_address = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&bind_address)?;
        info!("Starting server at http://{}", bind_address);

        self.run_with_listener(listener).await
    }

    /// Run the server with a specific TCP listener
    /// This is useful for testing where we want to use a random port
    pub async fn run_with_listener(&self, listener: TcpListener) -> Result<()> {
        let recommendation_service =
            web::Data::new(build_recommendation_service(&self.config)?);

        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header();

            App::new()
                .wrap(cors)
                .wrap(Logger::default())
                .app_data(json_config())
                .app_data(recommendation_service.clone())
                .service(api_routes())
                .service(openapi_route())
                .service(swagger_redirect_route())
                .service(swagger_routes())
        })
        .listen(listener)?
        .run()
        .await?;

        Ok(())
    }
}
