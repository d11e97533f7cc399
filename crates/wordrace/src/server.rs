//! `WordraceServer` builder and server loop.
//!
//! This is the entry point for running a Wordrace server. It ties together
//! all the layers: transport → protocol → gateway (sessions + rooms), plus
//! the sweep ticker and the HTTP surface.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use wordrace_clock::{Clock, TokioClock};
use wordrace_protocol::JsonCodec;
use wordrace_room::{RoomConfig, RoomRegistry};
use wordrace_transport::{Transport, WebSocketTransport};
use wordrace_words::WordCatalog;

use crate::gateway::{Command, CommandSender, Gateway};
use crate::handler::handle_connection;
use crate::http::{HttpState, router};
use crate::{ServerConfig, WordraceError};

/// Builder for configuring and starting a Wordrace server.
///
/// # Example
///
/// ```rust,ignore
/// use wordrace::prelude::*;
///
/// let server = WordraceServer::builder()
///     .bind("0.0.0.0:3001")
///     .http("0.0.0.0:3002")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct WordraceServerBuilder {
    config: ServerConfig,
    words: Option<WordCatalog>,
    clock: Option<Arc<dyn Clock>>,
    serve_http: bool,
}

impl WordraceServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            words: None,
            clock: None,
            serve_http: true,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the WebSocket listener address.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.ws_addr = addr.to_string();
        self
    }

    /// Sets the HTTP listener address.
    pub fn http(mut self, addr: &str) -> Self {
        self.config.http_addr = addr.to_string();
        self.serve_http = true;
        self
    }

    /// Don't serve the HTTP surface.
    pub fn without_http(mut self) -> Self {
        self.serve_http = false;
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.config.room = config;
        self
    }

    /// Reads word lists from `dir`. Ignored if [`words`](Self::words) is set.
    pub fn words_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.words_dir = dir.into();
        self
    }

    /// Uses a prepared catalog instead of the words directory.
    pub fn words(mut self, catalog: WordCatalog) -> Self {
        self.words = Some(catalog);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Restricts CORS to these origins. Empty allows any.
    pub fn allow_origins(mut self, origins: Vec<String>) -> Self {
        self.config.client_origins = origins;
        self
    }

    /// Binds the listeners and prepares the gateway.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<WordraceServer, WordraceError> {
        let transport = WebSocketTransport::bind(&self.config.ws_addr).await?;
        let http = if self.serve_http {
            let listener = TcpListener::bind(self.config.http_addr.as_str()).await?;
            tracing::info!(addr = %self.config.http_addr, "HTTP listening");
            Some(listener)
        } else {
            None
        };

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(TokioClock) as Arc<dyn Clock>);
        let words = self
            .words
            .unwrap_or_else(|| WordCatalog::from_dir(&self.config.words_dir));
        let registry = RoomRegistry::new(self.config.room.clone(), clock);

        let (commands, inbox) = mpsc::unbounded_channel();
        let gateway = Gateway::new(registry, words, commands.clone());

        Ok(WordraceServer {
            transport,
            http,
            gateway,
            commands,
            inbox,
            config: self.config,
        })
    }
}

impl Default for WordraceServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Wordrace server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct WordraceServer {
    transport: WebSocketTransport,
    http: Option<TcpListener>,
    gateway: Gateway,
    commands: CommandSender,
    inbox: mpsc::UnboundedReceiver<Command>,
    config: ServerConfig,
}

impl WordraceServer {
    /// Creates a new builder.
    pub fn builder() -> WordraceServerBuilder {
        WordraceServerBuilder::new()
    }

    /// Returns the address the WebSocket listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, WordraceError> {
        Ok(self.transport.local_addr()?)
    }

    /// Returns the address the HTTP listener is bound to, if serving HTTP.
    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Runs the gateway, the sweep ticker, the HTTP surface, and the accept
    /// loop. Runs until the process is terminated.
    pub async fn run(self) -> Result<(), WordraceError> {
        let WordraceServer {
            mut transport,
            http,
            gateway,
            commands,
            inbox,
            config,
        } = self;
        let started = Instant::now();

        tokio::spawn(gateway.run(inbox));
        tokio::spawn(sweep(commands.clone(), config.sweep_interval));

        if let Some(listener) = http {
            let app = router(
                HttpState {
                    commands: commands.clone(),
                    started,
                },
                &config.client_origins,
            );
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, app).await {
                    tracing::error!(error = %e, "HTTP server stopped");
                }
            });
        }

        tracing::info!("Wordrace server running");

        loop {
            match transport.accept().await {
                Ok(conn) => {
                    let commands = commands.clone();
                    let idle_timeout = config.idle_timeout;
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, commands, JsonCodec, idle_timeout).await
                        {
                            tracing::debug!(error = %e, "connection ended with error");
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

/// Asks the gateway to drop expired rooms every `period`.
async fn sweep(commands: CommandSender, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if commands.send(Command::Sweep).is_err() {
            break;
        }
    }
}
