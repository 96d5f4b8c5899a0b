//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one task per connection. The request body is
//! read up front so every route works on plain `Bytes` and can be driven
//! without a socket through [`dispatch`].

use bytes::Bytes;
use http_body_util::{BodyExt, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{HeaderMap, Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::{CodeExchanger, DisabledCodeExchanger, HttpCodeExchanger, JwtValidator};
use crate::config::Args;
use crate::db::FeedbackStore;
use crate::routes::{self, project_route, response, BoxBody};
use crate::services::PreviewClient;
use crate::types::{ApiError, Result};

/// Largest request body accepted (profiles and config patches are small)
pub const MAX_BODY_BYTES: usize = 256 * 1024;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub store: Arc<dyn FeedbackStore>,
    /// "mongodb" or "memory", reported by `/health`
    pub store_backend: &'static str,
    pub jwt: JwtValidator,
    /// Authorization-code exchange for `/auth/callback`
    pub auth: Arc<dyn CodeExchanger>,
    pub preview: PreviewClient,
}

impl AppState {
    /// Build state around an already-connected store.
    ///
    /// One outbound HTTP client is shared by the identity provider and the
    /// preview service.
    pub fn new(args: Args, store: Arc<dyn FeedbackStore>, store_backend: &'static str) -> Result<Self> {
        let secret = args
            .jwt_secret()
            .ok_or_else(|| ApiError::Config("JWT_SECRET is not set".into()))?;
        let jwt = JwtValidator::new(secret, args.jwt_audience.clone())?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("myratingis-api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let auth: Arc<dyn CodeExchanger> = match args.auth_url {
            Some(ref url) => Arc::new(HttpCodeExchanger::new(
                http.clone(),
                url,
                args.auth_api_key.clone(),
            )),
            None => {
                warn!("AUTH_URL not set, /auth/callback will always redirect to login");
                Arc::new(DisabledCodeExchanger)
            }
        };

        let preview = PreviewClient::new(http, &args.og_service_url, args.og_timeout());

        Ok(Self {
            args,
            store,
            store_backend,
            jwt,
            auth,
            preview,
        })
    }

    /// Replace the code exchanger (tests use a canned one)
    pub fn with_code_exchanger(mut self, auth: Arc<dyn CodeExchanger>) -> Self {
        self.auth = auth;
        self
    }
}

/// Start the HTTP server and run until Ctrl-C
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "MyRatingIs API listening on {} (store: {})",
        state.args.listen, state.store_backend
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - do not expose this instance publicly");
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            debug!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received, no longer accepting connections");
                return Ok(());
            }
        }
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();

    let body = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("[{}] {} {} body rejected: {}", addr, parts.method, path, e);
            return Ok(response::error_response(&ApiError::BadRequest(
                "Request body unreadable or too large".into(),
            )));
        }
    };

    let response = dispatch(
        &state,
        &parts.method,
        &path,
        parts.uri.query(),
        &parts.headers,
        body,
    )
    .await;

    info!(
        "[{}] {} {} -> {} ({} ms)",
        addr,
        parts.method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );

    Ok(response)
}

/// Route a fully-read request to its handler
pub async fn dispatch(
    state: &AppState,
    method: &Method,
    path: &str,
    query: Option<&str>,
    headers: &HeaderMap,
    body: Bytes,
) -> Response<BoxBody> {
    if *method == Method::OPTIONS {
        return routes::cors_preflight();
    }

    match (method, path) {
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => routes::health_check(state),

        (&Method::POST, "/api/auth/claim-ratings") => {
            routes::handle_claim_ratings(state, headers, &body).await
        }

        (&Method::POST, "/api/user/profile") => {
            routes::handle_save_profile(state, headers, &body).await
        }
        (&Method::GET, "/api/user/profile") => routes::handle_get_profile(state, headers).await,

        (&Method::GET, "/api/og-preview") => routes::handle_og_preview(state, query).await,

        (&Method::GET, "/auth/callback") => {
            routes::handle_auth_callback(state, headers, query).await
        }

        (m, p) => {
            if let Some(project_id) = project_route(p, "feedback-report") {
                return match *m {
                    Method::GET => routes::handle_feedback_report(state, &project_id).await,
                    _ => response::method_not_allowed(),
                };
            }
            if let Some(project_id) = project_route(p, "custom-config") {
                return match *m {
                    Method::PATCH => {
                        routes::handle_custom_config(state, headers, &project_id, &body).await
                    }
                    _ => response::method_not_allowed(),
                };
            }
            match p {
                "/health" | "/healthz" | "/api/auth/claim-ratings" | "/api/user/profile"
                | "/api/og-preview" | "/auth/callback" => response::method_not_allowed(),
                _ => response::not_found(p),
            }
        }
    }
}
