//! HTTP front end: `GET /generate` renders a fresh graph per request.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;
use swarm_mermaid_core::{ClusterState, TopologyGrapher};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

pub struct AppState<C> {
    grapher: TopologyGrapher,
    cluster: C,
}

impl<C> AppState<C> {
    pub fn new(grapher: TopologyGrapher, cluster: C) -> Self {
        Self { grapher, cluster }
    }
}

pub fn router<C>(state: Arc<AppState<C>>) -> Router
where
    C: ClusterState + Send + Sync + 'static,
{
    Router::new()
        .route("/generate", get(generate::<C>))
        .route("/healthz", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn generate<C>(State(state): State<Arc<AppState<C>>>) -> Response
where
    C: ClusterState + Send + Sync + 'static,
{
    match state.grapher.generate(&state.cluster).await {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            text,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "failed to generate topology graph");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not shut down within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Serves until `shutdown` resolves, then waits up to `shutdown_timeout` for in-flight
/// requests to finish.
pub async fn serve<C, S>(
    listener: TcpListener,
    state: Arc<AppState<C>>,
    shutdown: S,
    shutdown_timeout: Duration,
) -> Result<(), ServeError>
where
    C: ClusterState + Send + Sync + 'static,
    S: Future<Output = ()> + Send + 'static,
{
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        })
        .into_future();
    let mut server = tokio::spawn(server);

    tokio::select! {
        // The server stopped on its own (listener failure).
        res = &mut server => return Ok(res??),
        _ = shutdown => {}
    }

    info!("shutting down server...");
    let _ = stop_tx.send(());
    match tokio::time::timeout(shutdown_timeout, server).await {
        Ok(res) => res??,
        Err(_) => {
            warn!(timeout = ?shutdown_timeout, "in-flight requests still running, giving up");
            return Err(ServeError::ShutdownTimeout(shutdown_timeout));
        }
    }
    info!("server gracefully stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use swarm_mermaid_core::model::ResolutionMode;
    use swarm_mermaid_core::{FetchError, Network, NetworkFilter, Service, Snapshot, StaticCluster};
    use tower::ServiceExt;

    struct Unreachable;

    impl ClusterState for Unreachable {
        async fn list_networks(&self, _filter: &NetworkFilter) -> Result<Vec<Network>, FetchError> {
            Err(FetchError::new(
                "Cannot connect to the Docker daemon at unix:///var/run/docker.sock",
            ))
        }

        async fn list_services(&self) -> Result<Vec<Service>, FetchError> {
            Ok(Vec::new())
        }
    }

    fn cluster() -> StaticCluster {
        StaticCluster::new(Snapshot {
            networks: vec![Network::new("n1", "net-a").with_driver("overlay")],
            services: vec![
                Service::new("s1", "web")
                    .with_mode(ResolutionMode::Vip)
                    .with_virtual_ip("n1", "10.0.0.5/24"),
            ],
        })
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn generate_returns_the_graph() {
        let app = router(Arc::new(AppState::new(TopologyGrapher::new(), cluster())));
        let response = app.oneshot(get_request("/generate")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        assert_eq!(
            body_text(response).await,
            "network_n1{net-a}\nservice_s1(web)\nservice_s1 --- network_n1\n"
        );
    }

    #[tokio::test]
    async fn fetch_failure_is_a_500_with_the_message() {
        let app = router(Arc::new(AppState::new(TopologyGrapher::new(), Unreachable)));
        let response = app.oneshot(get_request("/generate")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_text(response).await,
            "Cannot connect to the Docker daemon at unix:///var/run/docker.sock"
        );
    }

    #[tokio::test]
    async fn unreachable_daemon_is_a_500_not_a_startup_failure() {
        let docker = bollard::Docker::connect_with_http(
            "tcp://127.0.0.1:1",
            2,
            bollard::API_DEFAULT_VERSION,
        )
        .unwrap();
        let cluster = swarm_mermaid_docker::DockerCluster::from_client(docker);
        let app = router(Arc::new(AppState::new(TopologyGrapher::new(), cluster)));
        let response = app.oneshot(get_request("/generate")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body_text(response).await.is_empty());
    }

    #[tokio::test]
    async fn only_get_is_routed() {
        let app = router(Arc::new(AppState::new(TopologyGrapher::new(), cluster())));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/generate")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn serve_returns_once_shutdown_resolves() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let state = Arc::new(AppState::new(TopologyGrapher::new(), cluster()));
        serve(listener, state, async {}, Duration::from_secs(5))
            .await
            .unwrap();
    }
}
