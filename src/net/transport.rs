//! WebTransport server implementation
//!
//! Each accepted session gets an entity id. Client messages arrive as
//! length-prefixed frames on bidirectional streams (and, for movement,
//! optionally as datagrams); they go through the shared `RoomSession`.
//! Deliveries land in each recipient's outbox queue and a writer task per
//! stream puts them on the wire.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc::UnboundedReceiver;
use wtransport::SendStream;

use crate::config::ServerConfig;
use crate::game::state::EntityId;
use crate::lobby::manager::RoomDirectory;
use crate::metrics::Metrics;
use crate::net::framing::{read_frame, write_frame, FramingError};
use crate::net::outbox::{Frame, Outbox};
use crate::net::protocol::{decode, ClientMessage};
use crate::net::room_session::RoomSession;
use crate::net::tls::TlsConfig;

/// How often room gauges are refreshed and summarized
const REPORT_INTERVAL: Duration = Duration::from_secs(30);

/// WebTransport server
pub struct WebTransportServer {
    config: ServerConfig,
    tls_config: TlsConfig,
    shared: Shared,
}

/// State every connection task needs
#[derive(Clone)]
struct Shared {
    session: Arc<RoomSession>,
    outbox: Arc<Outbox>,
    metrics: Arc<Metrics>,
}

impl WebTransportServer {
    /// Create a new WebTransport server
    pub async fn new(config: ServerConfig, metrics: Arc<Metrics>) -> anyhow::Result<Self> {
        let tls_config =
            TlsConfig::load(config.tls_cert_path.as_deref(), config.tls_key_path.as_deref()).await?;

        let directory = RoomDirectory::new(
            config.max_rooms,
            config.max_players_per_room,
            config.obstacles_default,
        );
        let shared = Shared {
            session: Arc::new(RoomSession::new(directory, metrics.clone())),
            outbox: Arc::new(Outbox::new()),
            metrics,
        };

        Ok(Self {
            config,
            tls_config,
            shared,
        })
    }

    /// Get the certificate hash for client configuration
    pub fn cert_hash(&self) -> &str {
        self.tls_config.cert_hash()
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.config.bind_address, self.config.port)
    }

    /// Run the server
    pub async fn run(self) -> anyhow::Result<()> {
        use wtransport::Endpoint;

        // An unspecified address binds dual-stack (IPv4 + IPv6)
        let builder = wtransport::ServerConfig::builder();
        let builder = if self.config.bind_address.is_unspecified() {
            builder.with_bind_default(self.config.port)
        } else {
            builder.with_bind_address(self.bind_addr())
        };
        let server_config = builder.with_identity(self.tls_config.identity).build();

        let server = Endpoint::server(server_config)?;

        tracing::info!("WebTransport server listening on port {}", self.config.port);

        let session = self.shared.session.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(REPORT_INTERVAL);
            loop {
                ticker.tick().await;
                session.report();
            }
        });

        loop {
            let incoming = server.accept().await;
            let shared = self.shared.clone();

            tokio::spawn(async move {
                if let Err(e) = handle_connection(incoming, shared).await {
                    tracing::warn!("Connection error: {}", e);
                }
            });
        }
    }
}

/// Milliseconds since the Unix epoch
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl Shared {
    /// Run one client message through the room session. Deliveries are
    /// queued before the room lock is released.
    fn dispatch(&self, sender: EntityId, message: ClientMessage) {
        let started = Instant::now();
        self.session.handle(sender, message, now_millis(), |delivery| {
            self.outbox.push(delivery);
        });
        self.metrics.record_handle_time(started.elapsed());
    }

    fn disconnect(&self, sender: EntityId) {
        self.outbox.unregister(sender);
        self.session.disconnect(sender, |delivery| {
            self.outbox.push(delivery);
        });
    }
}

/// Handle a single WebTransport connection
async fn handle_connection(
    incoming: wtransport::endpoint::IncomingSession,
    shared: Shared,
) -> anyhow::Result<()> {
    let session_request = incoming.await?;

    tracing::debug!(
        "New connection from: {:?}, path: {}",
        session_request.authority(),
        session_request.path()
    );

    let connection = session_request.accept().await?;
    let entity_id = uuid::Uuid::new_v4();
    Metrics::incr(&shared.metrics.connections_active);

    tracing::debug!("Connection accepted (entity: {})", entity_id);

    loop {
        tokio::select! {
            stream = connection.accept_bi() => {
                match stream {
                    Ok((send, recv)) => {
                        tracing::debug!("Accepted bidirectional stream");

                        // Latest stream wins as the member's outgoing channel
                        let queue = shared.outbox.register(entity_id);
                        tokio::spawn(write_stream(entity_id, send, queue, shared.metrics.clone()));

                        let shared = shared.clone();
                        tokio::spawn(async move {
                            read_stream(entity_id, recv, shared).await;
                        });
                    }
                    Err(e) => {
                        tracing::debug!("Stream accept error: {}", e);
                        break;
                    }
                }
            }

            // Datagrams carry movement intents only
            datagram = connection.receive_datagram() => {
                match datagram {
                    Ok(data) => {
                        Metrics::incr(&shared.metrics.messages_received);
                        Metrics::add(&shared.metrics.bytes_received, data.len() as u64);
                        match decode::<ClientMessage>(&data) {
                            Ok(message @ ClientMessage::Move { .. }) => {
                                shared.dispatch(entity_id, message);
                            }
                            Ok(_) => {}
                            Err(e) => {
                                Metrics::incr(&shared.metrics.decode_errors);
                                tracing::debug!("Failed to decode datagram: {}", e);
                            }
                        }
                    }
                    Err(e) => {
                        tracing::debug!("Datagram receive error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    // Clean up on disconnect
    shared.disconnect(entity_id);
    shared.metrics.connections_active.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);

    tracing::debug!("Connection closed (entity: {})", entity_id);
    Ok(())
}

/// Read frames from one stream until it closes or turns unusable
async fn read_stream(entity_id: EntityId, mut recv: wtransport::RecvStream, shared: Shared) {
    loop {
        let frame = match read_frame(&mut recv).await {
            Ok(frame) => frame,
            Err(FramingError::MessageTooLarge(len, max)) => {
                tracing::warn!("Rejected oversized message: {} bytes (max {})", len, max);
                break;
            }
            Err(e) => {
                tracing::debug!("Stream read error: {}", e);
                break;
            }
        };
        Metrics::incr(&shared.metrics.messages_received);
        Metrics::add(&shared.metrics.bytes_received, frame.len() as u64 + 4);

        let message: ClientMessage = match decode(&frame) {
            Ok(msg) => msg,
            Err(e) => {
                Metrics::incr(&shared.metrics.decode_errors);
                tracing::warn!("Failed to decode client message: {}", e);
                continue;
            }
        };

        tracing::debug!("{} -> {:?}", entity_id, message);
        shared.dispatch(entity_id, message);
    }
}

/// Drain one queue into its stream until the queue closes or a write fails
async fn write_stream(
    entity_id: EntityId,
    mut send: SendStream,
    mut queue: UnboundedReceiver<Frame>,
    metrics: Arc<Metrics>,
) {
    while let Some(frame) = queue.recv().await {
        if let Err(e) = write_frame(&mut send, &frame).await {
            tracing::debug!("Failed to send to {}: {}", entity_id, e);
            break;
        }
        Metrics::incr(&metrics.messages_sent);
        Metrics::add(&metrics.bytes_sent, frame.len() as u64 + 4);
    }
}
