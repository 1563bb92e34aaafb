//! `LiveQuizServer` builder and accept loop.
//!
//! This is the entry point for running a quiz server. It ties the layers
//! together: transport → protocol → registry → session → broadcast.

use std::sync::Arc;
use std::time::Duration;

use livequiz_protocol::{Codec, JsonCodec};
use livequiz_registry::{SessionRegistry, TemplateCatalog};
use livequiz_transport::{Transport, WebSocketTransport};

use crate::config::ServerConfig;
use crate::handler::handle_connection;
use crate::LiveQuizError;

/// Shared server state handed to each connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: Arc<SessionRegistry>,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a quiz server.
///
/// # Example
///
/// ```rust,no_run
/// use livequiz::prelude::*;
///
/// # async fn run() -> Result<(), LiveQuizError> {
/// let catalog = TemplateCatalog::load(&DirTemplateStore::new("quizzes"));
/// let server = LiveQuizServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(catalog)
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LiveQuizServerBuilder {
    bind_addr: String,
    listener_capacity: usize,
    idle_timeout: Duration,
}

impl LiveQuizServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from a loaded configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            bind_addr: config.bind.clone(),
            listener_capacity: config.listener_capacity,
            idle_timeout: config.idle_timeout,
        }
    }

    /// Sets the address to bind to. Port 0 picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Events buffered per watching connection before new ones are
    /// dropped for it.
    pub fn listener_capacity(mut self, capacity: usize) -> Self {
        self.listener_capacity = capacity;
        self
    }

    /// Closes connections that send nothing for this long.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Binds the listener and builds a server over a fresh registry.
    pub async fn build(self, catalog: TemplateCatalog) -> Result<LiveQuizServer<JsonCodec>, LiveQuizError> {
        let registry = Arc::new(SessionRegistry::with_listener_capacity(
            catalog,
            self.listener_capacity,
        ));
        self.build_with_registry(registry).await
    }

    /// Binds the listener and builds a server over an existing registry.
    /// The registry's own listener capacity applies.
    pub async fn build_with_registry(
        self,
        registry: Arc<SessionRegistry>,
    ) -> Result<LiveQuizServer<JsonCodec>, LiveQuizError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry,
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
        });

        Ok(LiveQuizServer { transport, state })
    }
}

impl Default for LiveQuizServerBuilder {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

/// A bound quiz server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct LiveQuizServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl LiveQuizServer<JsonCodec> {
    pub fn builder() -> LiveQuizServerBuilder {
        LiveQuizServerBuilder::new()
    }
}

impl<C: Codec> LiveQuizServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The registry this server creates sessions in.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.state.registry
    }

    /// Runs the accept loop until the process exits.
    ///
    /// Each accepted connection gets its own task. A failed accept is
    /// logged and the loop keeps going.
    pub async fn run(mut self) -> Result<(), LiveQuizError> {
        tracing::info!(
            addr = ?self.local_addr().ok(),
            templates = self.state.registry.template_names().len(),
            "livequiz server running"
        );

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        let conn_id = conn.id();
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(%conn_id, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
