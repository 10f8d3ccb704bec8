use axum::{
    routing::{get, post},
    Router,
};
use chrono::Utc;
use skillbridge_backend::config::{get_config, init_config};
use skillbridge_backend::{routes, AppState, PolicySettings};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let app_state = AppState::new(PolicySettings::from_config());

    {
        let state = app_state.clone();
        let poll = Duration::from_millis(config.queue_poll_ms);
        tokio::spawn(async move {
            loop {
                match state.queue.run_once().await {
                    Ok(true) => {}
                    Ok(false) => {
                        tokio::time::sleep(poll).await;
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "submission queue worker error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });
    }

    {
        let state = app_state.clone();
        tokio::spawn(async move {
            loop {
                match state.verification.run_once() {
                    Ok(true) => {}
                    Ok(false) => {
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "verification worker error");
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        });
    }

    {
        // Deadlines are also enforced lazily on each request; the sweeper
        // only exists so abandoned attempts still finish on their own.
        let state = app_state.clone();
        tokio::spawn(async move {
            loop {
                let expired = state.assessments.sweep_once(Utc::now());
                if expired > 0 {
                    info!(expired, "expired overdue questions");
                }
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let public_api = Router::new()
        .route(
            "/api/assessments/:id/question",
            get(routes::assessment::get_current_question),
        )
        .route(
            "/api/assessments/:id/answer",
            post(routes::assessment::submit_answer),
        )
        .route(
            "/api/assessments/:id/complete",
            post(routes::assessment::complete_assessment),
        )
        .route(
            "/api/assessments/:id/results",
            get(routes::assessment::get_results),
        )
        .route(
            "/api/assessments/:id/progress",
            get(routes::assessment::get_progress),
        )
        .route(
            "/api/assessments/:id/violation",
            post(routes::assessment::report_violation),
        )
        .route(
            "/api/submissions",
            post(routes::submissions::create_submission),
        )
        .route(
            "/api/submissions/:id",
            get(routes::submissions::get_submission),
        )
        .route(
            "/api/submissions/:id/stream",
            get(routes::submissions::stream_submission),
        )
        .layer(axum::middleware::from_fn_with_state(
            skillbridge_backend::middleware::rate_limit::new_rps_state(config.public_rps),
            skillbridge_backend::middleware::rate_limit::rps_middleware,
        ));

    let integration_api = Router::new()
        .route(
            "/api/integration/assessments",
            post(routes::integration::create_assessment),
        )
        .route(
            "/api/integration/assessments/:id/audit",
            get(routes::integration::get_assessment_audit),
        )
        .route(
            "/api/integration/verification/runs",
            post(routes::integration::start_verification_run),
        )
        .route(
            "/api/integration/verification/runs/:id",
            get(routes::integration::get_verification_run),
        )
        .layer(axum::middleware::from_fn(
            skillbridge_backend::middleware::auth::require_hr_or_admin,
        ))
        .layer(axum::middleware::from_fn_with_state(
            skillbridge_backend::middleware::rate_limit::new_rps_state(config.integration_rps),
            skillbridge_backend::middleware::rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(public_api)
        .merge(integration_api)
        .layer(skillbridge_backend::middleware::cors::permissive_cors())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let listener = TcpListener::bind(&config.server_address).await?;
    info!("listening on {}", config.server_address);
    axum::serve(listener, app).await?;

    Ok(())
}
