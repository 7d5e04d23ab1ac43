use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use study_assistant::api::{create_router, AppState};
use study_assistant::application::{
    DocumentService, OcrService, RagService, SessionController, SessionRegistry, StudyService,
    ViewLimits,
};
use study_assistant::domain::TextSplitter;
use study_assistant::infrastructure::{
    AppConfig, DocumentLoader, GeminiCredentials, GeminiEmbedding, GeminiFileClient, GeminiLlm,
    InMemoryVectorStoreFactory,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "study_assistant=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_controller(
    config: &AppConfig,
    credentials: &GeminiCredentials,
) -> anyhow::Result<SessionController> {
    let settings = &config.config;
    let prompts = Arc::new(config.prompts.clone());

    let documents = DocumentService::new(
        DocumentLoader::new(),
        TextSplitter::new(settings.rag.chunk_size, settings.rag.chunk_overlap)?,
    );
    let rag = RagService::new(
        Arc::new(GeminiEmbedding::from_config(&settings.embedding)),
        Arc::new(InMemoryVectorStoreFactory),
        settings.rag.top_k,
    );
    let study = StudyService::new(
        Arc::new(GeminiLlm::study(&settings.llm)),
        Arc::new(GeminiLlm::qna(&settings.llm)),
        prompts.clone(),
        settings.limits.clone(),
    );
    let ocr = OcrService::new(
        Arc::new(GeminiFileClient::from_config(credentials.api_key(), &settings.ocr)),
        prompts.ocr.instructions.clone(),
        Duration::from_secs(settings.ocr.timeout_seconds),
    );

    Ok(SessionController::new(
        documents,
        rag,
        study,
        ocr,
        ViewLimits {
            excerpt_chars: settings.limits.source_excerpt_chars,
            preview_chars: settings.ocr.preview_chars,
        },
    ))
}

fn spawn_session_sweeper(sessions: SessionRegistry) {
    let period = (sessions.idle_ttl() / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            sessions.evict_idle().await;
        }
    });
}

async fn serve(config: AppConfig, credentials: GeminiCredentials) -> anyhow::Result<()> {
    let controller = build_controller(&config, &credentials)?;
    let addr = SocketAddr::new(config.config.server.host.parse()?, config.config.server.port);
    info!(
        model = %config.config.llm.model,
        embedding_model = %config.config.embedding.model,
        "services initialized"
    );

    let state = AppState::new(controller, config);
    spawn_session_sweeper(state.sessions.clone());
    let app = create_router(state);

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::load()?;
    let credentials = match GeminiCredentials::resolve() {
        Ok(credentials) => credentials,
        Err(e) => {
            tracing::error!(error = %e, "Gemini API key missing, refusing to start");
            return Err(e.into());
        }
    };
    // The provider reads its key from the environment; set it while single-threaded.
    credentials.export_for_provider();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(serve(config, credentials))
}
