mod app_state;
mod config;
mod models;
mod routes;
mod services;

use axum::response::Html;
use axum::{routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;
use services::grader::GradingRunner;
use services::registry::JobRegistry;
use services::repository::ClassRepository;
use services::submissions::SubmissionService;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing exam-prep-server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!("grading_jobs_total", "Total grading jobs submitted");
    metrics::describe_counter!(
        "grading_jobs_completed",
        "Total grading jobs that completed with a results file"
    );
    metrics::describe_counter!("grading_jobs_failed", "Total grading jobs that failed");
    metrics::describe_histogram!(
        "grading_duration_seconds",
        "Wall time of the external grading script per job"
    );

    // Initialize the class tree repository
    let repo = Arc::new(ClassRepository::new(&config.project_root));

    // Initialize the job registry with its durable mirror directory
    tracing::info!(jobs_dir = %config.jobs_dir, "Initializing grading job registry");
    let registry =
        Arc::new(JobRegistry::new(&config.jobs_dir).expect("Failed to create grading jobs directory"));

    // Initialize the grading runner and submission service
    let grader = Arc::new(GradingRunner::new(
        Arc::clone(&registry),
        &config.project_root,
        &config.grade_script,
    ));
    let submissions = Arc::new(SubmissionService::new(
        Arc::clone(&repo),
        Arc::clone(&registry),
        grader,
    ));

    // Create shared application state
    let state = AppState::new(repo, registry, submissions);

    // Build routes
    let app = Router::new()
        // HTML pages (embedded at compile time)
        .route("/", get(|| async { Html(include_str!("../static/index.html")) }))
        .route(
            "/class/{class_name}",
            get(|| async { Html(include_str!("../static/class.html")) }),
        )
        // Class catalog API
        .route("/api/classes", get(routes::classes::list_classes))
        .route("/api/class/{class_name}", get(routes::classes::class_info))
        // Content delivery
        .route("/quiz/{class_name}/{quiz_file}", get(routes::content::serve_quiz))
        .route("/guide/{class_name}/{filename}", get(routes::content::serve_guide))
        .route(
            "/results/{class_name}/{filename}",
            get(routes::content::serve_results),
        )
        // Answers and grading
        .route("/api/answers/{class_name}", post(routes::answers::submit_answers))
        .route(
            "/api/answers/{class_name}/{filename}",
            get(routes::answers::get_answer_file),
        )
        .route(
            "/api/grading-status/{job_id}",
            get(routes::grading::grading_status),
        )
        .route("/health", get(routes::health::health_check))
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024)); // 10 MB limit for essay answers

    tracing::info!(
        project_root = %config.project_root,
        "Starting exam-prep-server on {}",
        config.bind_addr
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
