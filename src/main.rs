use signquiz::{
    config::QuizConfig,
    question::{DictionaryQuestionBank, QuestionBank},
    room::{
        cleanup_task::{start_cleanup_task, CleanupConfig},
        repository::InMemoryRoomRepository,
    },
    routes::router,
    shared::AppState,
    user::InMemoryUserRepository,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signquiz=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sign quiz server");

    let config = QuizConfig::from_env();

    let options = config.options_per_question;
    let question_bank: Arc<dyn QuestionBank> = match &config.dictionary_path {
        Some(path) => match DictionaryQuestionBank::from_json_file(path, options) {
            Ok(bank) => Arc::new(bank),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to load dictionary");
                std::process::exit(1);
            }
        },
        None => {
            warn!("SIGNQUIZ_DICTIONARY_PATH not set, using the built-in word list");
            Arc::new(DictionaryQuestionBank::builtin(options))
        }
    };

    let room_repository = Arc::new(InMemoryRoomRepository::new(config.lock_timeout));
    let user_repository = Arc::new(InMemoryUserRepository::new());
    let bind_addr = config.bind_addr.clone();
    let cleanup_config = CleanupConfig::from(&config);

    let app_state = AppState::new(config, room_repository, user_repository, question_bank);

    // Background sweep for idle rooms and stalled questions
    tokio::spawn(start_cleanup_task(
        Arc::clone(&app_state.room_repository),
        Arc::clone(&app_state.session_service),
        cleanup_config,
    ));

    let app = router(app_state);

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(bind_addr = %bind_addr, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };
    info!("Server running on http://{}", bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server error");
    }
}
