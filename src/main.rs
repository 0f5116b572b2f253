use anyhow::{Context, Result};
use encyclopedia_content_api::api::{self, AppState};
use encyclopedia_content_api::config::Config;
use encyclopedia_content_api::content::ContentStore;
use encyclopedia_content_api::layout::LayoutTable;
use encyclopedia_content_api::names::NameOverrides;
use encyclopedia_content_api::service::EncyclopediaService;
use encyclopedia_content_api::store::PgDocumentStore;
use encyclopedia_content_api::translation::GoogleMobileTranslator;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encyclopedia_content_api=info,tower_http=info".into()),
        )
        .init();

    info!("Starting encyclopedia content API");

    // Load configuration from environment
    let config = Config::from_env()?;

    let store = PgDocumentStore::connect(&config.database_url)
        .await
        .context("Failed to connect to the database")?;
    info!("Connected to the database");

    let translator = GoogleMobileTranslator::new(&config.translate_url, config.translation_timeout)
        .context("Failed to create translation client")?;

    let layouts = LayoutTable::load(config.layout_file.as_deref())?;
    let names = NameOverrides::load(config.name_overrides_file.as_deref())?;

    let service = EncyclopediaService::new(Arc::new(store), Arc::new(translator))
        .with_layouts(layouts)
        .with_names(names);

    let state = Arc::new(AppState {
        service,
        content: ContentStore::new(config.content_dir.clone()),
        import_api_key: config.import_api_key.clone(),
    });

    let app = api::router(state, &config.accepted_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Server is running on port {}", config.port);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
