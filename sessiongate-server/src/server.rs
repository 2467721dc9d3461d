//! HTTP/1.1 server implementation

use crate::auth_gate::AuthGate;
use crate::handlers::route;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use sessiongate_core::auth::SessionTokens;
use sessiongate_engine::NameStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

/// Everything a request handler can reach
pub struct AppState {
    pub names: NameStore,
    pub gate: AuthGate,
}

impl AppState {
    pub fn new(names: NameStore, tokens: Arc<SessionTokens>, cookie_name: impl Into<String>) -> Self {
        AppState {
            names,
            gate: AuthGate::new(tokens, cookie_name),
        }
    }
}

pub struct SessionGateServer {
    state: Arc<AppState>,
}

impl SessionGateServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve_listener(listener).await
    }

    /// Accept connections on an already bound listener until it fails
    pub async fn serve_listener(self, listener: TcpListener) -> anyhow::Result<()> {
        info!("sessiongate server listening on {}", listener.local_addr()?);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            debug!("New connection from {}", remote_addr);

            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                if let Err(err) = Self::handle_connection(stream, state).await {
                    error!("Connection error from {}: {}", remote_addr, err);
                }
            });
        }
    }

    async fn handle_connection(stream: TcpStream, state: Arc<AppState>) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req| route(req, Arc::clone(&state)));

        http1::Builder::new().serve_connection(io, service).await
    }
}
