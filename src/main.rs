use axum::{
    routing::{get, post},
    Router,
};
use interview_backend::services::{
    mail_service::WebhookMailer, queue_service::NotificationQueueService,
};
use interview_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
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

    // Delivery worker: decoupled from request handlers, drains the
    // notification queue one job at a time.
    {
        let state = app_state.clone();
        let mailer = WebhookMailer::new(
            config.mail_webhook_url.clone(),
            config.mail_webhook_secret.clone(),
            config.mail_from.clone(),
        );
        tokio::spawn(async move {
            let queue = NotificationQueueService::new(
                state.pool.clone(),
                get_config().queue_max_attempts,
            );
            loop {
                match queue.run_once(&mailer).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tokio::time::sleep(Duration::from_millis(1000)).await;
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "Notification worker error");
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let integration_api = Router::new()
        .route(
            "/api/integration/interviews/plan-slots",
            post(routes::schedule::plan_slots),
        )
        .route(
            "/api/integration/interviews/allocate",
            post(routes::schedule::allocate_interviews),
        )
        .route(
            "/api/integration/interviews",
            get(routes::interview::list_interviews),
        )
        .route(
            "/api/integration/interviews/:id",
            get(routes::interview::get_interview),
        )
        .route(
            "/api/integration/interviews/:id/score",
            post(routes::interview::score_interview),
        )
        .route(
            "/api/integration/interviews/:id/notify",
            post(routes::interview::send_single_notification),
        )
        .route(
            "/api/integration/result-workflows",
            post(routes::workflow::start_workflow),
        )
        .route(
            "/api/integration/result-workflows/:id",
            get(routes::workflow::get_workflow),
        )
        .route(
            "/api/integration/result-workflows/:id/confirm",
            post(routes::workflow::confirm_step),
        )
        .route(
            "/api/integration/result-workflows/:id/finalize",
            post(routes::workflow::finalize_workflow),
        )
        .route(
            "/api/integration/notifications/status",
            get(routes::notifications::queue_status),
        )
        .route(
            "/api/integration/notifications/retry-failed",
            post(routes::notifications::retry_failed),
        )
        .layer(axum::middleware::from_fn_with_state(
            interview_backend::middleware::rate_limit::new_rps_state(config.integration_rps),
            interview_backend::middleware::rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(integration_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
