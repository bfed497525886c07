//! Application startup and lifecycle management.

use axum::middleware::from_fn;
use axum::{
    routing::{get, post, put},
    Router,
};
use mongodb::{options::ClientOptions, Client};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::config::{Config, GatewayProvider};
use crate::handlers;
use crate::services::{
    MockGateway, PaymentGateway, PaymentRepository, PaymentService, PaymentStore, StripeClient,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub payments: PaymentService,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Connect to MongoDB and the configured gateway, then bind the listener.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let mut client_options = ClientOptions::parse(config.database.url.expose_secret())
            .await
            .map_err(|e| {
                tracing::error!("Failed to parse MongoDB connection string: {}", e);
                AppError::DatabaseError(e.into())
            })?;
        client_options.app_name = Some(config.service_name.clone());

        let client = Client::with_options(client_options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::DatabaseError(e.into())
        })?;
        let db = client.database(&config.database.db_name);

        let repository = PaymentRepository::new(&db);
        repository.init_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e))
        })?;

        let gateway: Arc<dyn PaymentGateway> = match config.gateway.provider {
            GatewayProvider::Stripe => {
                let stripe = StripeClient::new(config.gateway.stripe.clone())
                    .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
                if stripe.is_configured() {
                    tracing::info!("Stripe client initialized");
                } else {
                    tracing::warn!(
                        "Stripe credentials not configured - payment features will be limited"
                    );
                }
                Arc::new(stripe)
            }
            GatewayProvider::Mock => {
                tracing::warn!("Using mock payment gateway");
                Arc::new(MockGateway::new())
            }
        };

        Self::build_with(config, Arc::new(repository), gateway).await
    }

    /// Wire the service over an explicit store and gateway and bind the
    /// listener (port 0 picks a free port).
    pub async fn build_with(
        config: Config,
        store: Arc<dyn PaymentStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Result<Self, AppError> {
        let payments = PaymentService::new(store, gateway, config.gateway.stripe.currency.clone());

        let addr = format!("{}:{}", config.common.host, config.common.port);
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Payment service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            state: AppState { payments },
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until SIGINT/SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = router(self.state);
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

pub fn router(state: AppState) -> Router {
    let payments = Router::new()
        .route(
            "/create-intent",
            post(handlers::payments::create_payment_intent),
        )
        .route(
            "/confirm/:paymentIntentId",
            post(handlers::payments::confirm_payment),
        )
        .route("/:id/refund", put(handlers::payments::refund_payment))
        .route(
            "/order/:orderId",
            get(handlers::payments::get_payment_by_order_id),
        )
        .route(
            "/user/:userId",
            get(handlers::payments::get_payments_by_user_id),
        )
        .route("/:id", get(handlers::payments::get_payment_by_id));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .nest("/api/payments", payments)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
