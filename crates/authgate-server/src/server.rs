use std::{net::SocketAddr, sync::Arc};

use authgate_auth::{AccountService, AuthState, UserStorage, auth_router};
use axum::{Router, http::Request, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    config::AppConfig,
    handlers,
    middleware::{self as app_middleware, REQUEST_ID_HEADER, RequestId},
};

pub struct AuthgateServer {
    addr: SocketAddr,
    app: Router,
}

/// Builds the application backed by a fresh in-memory user directory.
pub fn build_app(cfg: &AppConfig) -> Router {
    build_app_with_storage(cfg, authgate_db_memory::create_user_storage())
}

/// Builds the application on top of the given user directory.
pub fn build_app_with_storage(cfg: &AppConfig, store: Arc<dyn UserStorage>) -> Router {
    let accounts = AccountService::new(Arc::new(cfg.auth.clone()), store);
    let body_limit = cfg.server.body_limit_bytes;

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .merge(auth_router(AuthState::new(accounts)))
        // Layers run bottom-up: request id, then trace, then the routes
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    use tracing::field::Empty;
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri().path(),
                        http.status_code = Empty,
                        request_id = %request_id_of(req)
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

/// Request id set by the request id middleware, else the raw header.
fn request_id_of<B>(req: &Request<B>) -> String {
    if let Some(id) = req.extensions().get::<RequestId>() {
        return id.as_str().to_string();
    }
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    store: Option<Arc<dyn UserStorage>>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            store: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn with_storage(mut self, store: Arc<dyn UserStorage>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> AuthgateServer {
        let app = match self.store {
            Some(store) => build_app_with_storage(&self.config, store),
            None => build_app(&self.config),
        };

        AuthgateServer {
            addr: self.addr,
            app,
        }
    }
}

impl AuthgateServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!(addr = %self.addr, "listening");
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
