//! Order lifecycle, invoicing and payment tracking service for laundry
//! operations.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::middleware::from_fn;
use axum::{
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    http_metrics::track_http_metrics, request_id::request_id_middleware,
    security_headers::security_headers_middleware,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use config::OrderConfig;
use services::{init_metrics, Database, Notifier};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: OrderConfig,
    pub db: Arc<Database>,
    pub notifier: Notifier,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: OrderConfig) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        db.run_migrations().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            e
        })?;

        let notifier = Notifier::new(config.notifier.webhook_url.clone());
        if notifier.is_configured() {
            tracing::info!("Notification dispatcher configured");
        } else {
            tracing::warn!("Notification webhook not configured - status-change dispatch disabled");
        }

        let state = AppState {
            config: config.clone(),
            db: Arc::new(db),
            notifier,
        };

        let router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/metrics", get(handlers::metrics_handler))
            // Pricing catalog (read-only here; maintained by configuration)
            .route("/services", get(handlers::catalog::list_services))
            // Customer matcher for the intake form
            .route("/customers/match", get(handlers::customers::match_customer))
            // Invoice lifecycle
            .route("/invoices/quote", post(handlers::invoices::quote))
            .route(
                "/invoices",
                post(handlers::invoices::create_invoice).get(handlers::invoices::list_invoices),
            )
            .route("/invoices/:id", get(handlers::invoices::get_invoice))
            .route(
                "/invoices/:id/transition",
                post(handlers::invoices::transition),
            )
            .route(
                "/invoices/:id/payment",
                post(handlers::invoices::collect_payment),
            )
            .layer(from_fn(security_headers_middleware))
            .layer(from_fn(track_http_metrics))
            .layer(from_fn(request_id_middleware))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        employee_id = tracing::field::Empty,
                        employee_role = tracing::field::Empty,
                    )
                }),
            )
            .with_state(state);

        // Port 0 binds a random port, used by the test harness.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Order service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }
}
