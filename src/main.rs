use axum::{
    routing::{get, post},
    Router,
};
use placement_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let student_api = Router::new()
        .route("/exams", get(routes::exams::list_exams))
        .route("/exams/:id/questions", get(routes::exams::exam_questions))
        .route("/attempts/start", post(routes::attempts::start_attempt))
        .route("/attempts/submit", post(routes::attempts::submit_attempt))
        .route("/integrity/log", post(routes::integrity::log_event))
        .route(
            "/interviews/start",
            post(routes::interviews::start_interview),
        )
        .route("/interviews/turn", post(routes::interviews::append_turn))
        .route(
            "/interviews/submit",
            post(routes::interviews::submit_interview),
        )
        .layer(axum::middleware::from_fn(
            placement_backend::middleware::auth::require_student,
        ))
        .layer(axum::middleware::from_fn_with_state(
            placement_backend::middleware::rate_limit::new_rps_state(config.student_rps),
            placement_backend::middleware::rate_limit::rps_middleware,
        ));

    let tpo_api = Router::new()
        .route("/tpo/exams", post(routes::exams::create_exam))
        .route(
            "/tpo/exams/:id/attempts",
            get(routes::attempts::list_exam_attempts),
        )
        .route(
            "/tpo/attempts/:id/logs",
            get(routes::integrity::attempt_logs),
        )
        .route(
            "/tpo/interviews",
            get(routes::interviews::list_interviews).post(routes::interviews::create_interview),
        )
        .layer(axum::middleware::from_fn(
            placement_backend::middleware::auth::require_tpo_or_admin,
        ))
        .layer(axum::middleware::from_fn_with_state(
            placement_backend::middleware::rate_limit::new_rps_state(config.tpo_rps),
            placement_backend::middleware::rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(student_api)
        .merge(tpo_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
