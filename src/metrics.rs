//! Prometheus-compatible metrics endpoint
//!
//! Exposes room, round and traffic counters in Prometheus text format.
//! Default endpoint: http://localhost:9090/metrics

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Samples kept for handling-time percentiles
const HANDLE_HISTORY_LEN: usize = 1000;

/// Metrics registry for the game server
#[derive(Debug)]
pub struct Metrics {
    // Directory
    pub rooms_active: AtomicU64,
    pub players_connected: AtomicU64,
    pub rooms_playing: AtomicU64,

    // Rounds
    pub rounds_started: AtomicU64,
    pub rounds_finished: AtomicU64,
    pub captures: AtomicU64,

    // Movement
    pub moves_accepted: AtomicU64,
    pub moves_rejected: AtomicU64,

    // Network stats
    pub connections_active: AtomicU64,
    pub messages_sent: AtomicU64,
    pub messages_received: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub bytes_received: AtomicU64,
    pub decode_errors: AtomicU64,

    // Message handling time (microseconds)
    pub handle_time_p95_us: AtomicU64,
    pub handle_time_max_us: AtomicU64,

    start_time: Instant,
    handle_history: RwLock<VecDeque<u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            rooms_active: AtomicU64::new(0),
            players_connected: AtomicU64::new(0),
            rooms_playing: AtomicU64::new(0),
            rounds_started: AtomicU64::new(0),
            rounds_finished: AtomicU64::new(0),
            captures: AtomicU64::new(0),
            moves_accepted: AtomicU64::new(0),
            moves_rejected: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            handle_time_p95_us: AtomicU64::new(0),
            handle_time_max_us: AtomicU64::new(0),
            start_time: Instant::now(),
            handle_history: RwLock::new(VecDeque::with_capacity(HANDLE_HISTORY_LEN)),
        }
    }

    #[inline]
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add(counter: &AtomicU64, value: u64) {
        counter.fetch_add(value, Ordering::Relaxed);
    }

    /// Record how long one client message took to handle
    pub fn record_handle_time(&self, duration: Duration) {
        if !cfg!(feature = "metrics_extended") {
            return;
        }
        let us = duration.as_micros() as u64;

        let mut history = self.handle_history.write();
        history.push_back(us);
        while history.len() > HANDLE_HISTORY_LEN {
            history.pop_front();
        }

        if history.len() >= 10 {
            let mut sorted: Vec<u64> = history.iter().copied().collect();
            sorted.sort_unstable();
            let p95_idx = ((sorted.len() as f32 * 0.95) as usize).min(sorted.len() - 1);
            self.handle_time_p95_us.store(sorted[p95_idx], Ordering::Relaxed);
            self.handle_time_max_us
                .store(sorted.last().copied().unwrap_or(0), Ordering::Relaxed);
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    fn load(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    /// Generate Prometheus-format metrics output
    pub fn to_prometheus(&self) -> String {
        let mut output = String::with_capacity(2048);

        macro_rules! metric {
            ($name:expr, $help:expr, $type:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $name, $help, $name, $type, $name, $value
                ));
            };
        }

        metric!("chase_arena_rooms_active", "Rooms currently open", "gauge",
            Self::load(&self.rooms_active));
        metric!("chase_arena_players_connected", "Players in a room", "gauge",
            Self::load(&self.players_connected));
        metric!("chase_arena_rooms_playing", "Rooms with a round in progress", "gauge",
            Self::load(&self.rooms_playing));

        metric!("chase_arena_rounds_started_total", "Rounds started", "counter",
            Self::load(&self.rounds_started));
        metric!("chase_arena_rounds_finished_total", "Rounds ended by capture or departure", "counter",
            Self::load(&self.rounds_finished));
        metric!("chase_arena_captures_total", "Chased entities caught", "counter",
            Self::load(&self.captures));

        metric!("chase_arena_moves_accepted_total", "Accepted movement intents", "counter",
            Self::load(&self.moves_accepted));
        metric!("chase_arena_moves_rejected_total", "Movement intents blocked or ignored", "counter",
            Self::load(&self.moves_rejected));

        metric!("chase_arena_connections_active", "Active WebTransport connections", "gauge",
            Self::load(&self.connections_active));
        metric!("chase_arena_messages_sent_total", "Total messages sent", "counter",
            Self::load(&self.messages_sent));
        metric!("chase_arena_messages_received_total", "Total messages received", "counter",
            Self::load(&self.messages_received));
        metric!("chase_arena_bytes_sent_total", "Total bytes sent", "counter",
            Self::load(&self.bytes_sent));
        metric!("chase_arena_bytes_received_total", "Total bytes received", "counter",
            Self::load(&self.bytes_received));
        metric!("chase_arena_decode_errors_total", "Frames that failed to decode", "counter",
            Self::load(&self.decode_errors));

        #[cfg(feature = "metrics_extended")]
        {
            metric!("chase_arena_handle_time_p95_microseconds", "95th percentile message handling time", "gauge",
                Self::load(&self.handle_time_p95_us));
            metric!("chase_arena_handle_time_max_microseconds", "Maximum message handling time", "gauge",
                Self::load(&self.handle_time_max_us));
        }

        metric!("chase_arena_uptime_seconds", "Server uptime in seconds", "counter",
            self.uptime_seconds());

        output
    }

    /// Generate JSON format metrics (alternative for direct API access)
    pub fn to_json(&self) -> String {
        json!({
            "rooms": {
                "active": Self::load(&self.rooms_active),
                "players": Self::load(&self.players_connected),
                "playing": Self::load(&self.rooms_playing),
            },
            "rounds": {
                "started": Self::load(&self.rounds_started),
                "finished": Self::load(&self.rounds_finished),
                "captures": Self::load(&self.captures),
            },
            "moves": {
                "accepted": Self::load(&self.moves_accepted),
                "rejected": Self::load(&self.moves_rejected),
            },
            "network": {
                "connections": Self::load(&self.connections_active),
                "messages_sent": Self::load(&self.messages_sent),
                "messages_received": Self::load(&self.messages_received),
                "bytes_sent": Self::load(&self.bytes_sent),
                "bytes_received": Self::load(&self.bytes_received),
                "decode_errors": Self::load(&self.decode_errors),
            },
            "handling": {
                "p95_us": Self::load(&self.handle_time_p95_us),
                "max_us": Self::load(&self.handle_time_max_us),
            },
            "uptime_seconds": self.uptime_seconds(),
        })
        .to_string()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn http_response(content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        content_type,
        body.len(),
        body
    )
}

/// Pick the response for one raw HTTP request
fn route(request: &str, metrics: &Metrics) -> String {
    let path = request
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("GET "))
        .and_then(|rest| rest.split_whitespace().next());

    match path {
        Some("/metrics/json") | Some("/json") => http_response("application/json", &metrics.to_json()),
        Some("/metrics") => {
            http_response("text/plain; version=0.0.4", &metrics.to_prometheus())
        }
        Some("/health") | Some("/") => http_response("text/plain", "OK"),
        _ => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
    }
}

/// Start the metrics HTTP server
pub async fn start_metrics_server(metrics: Arc<Metrics>, bind: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{}:{}", bind, port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Metrics server listening on http://{}/metrics", addr);

    loop {
        let (mut socket, peer) = listener.accept().await?;
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 1024];

            match socket.read(&mut buffer).await {
                Ok(n) if n > 0 => {
                    let request = String::from_utf8_lossy(&buffer[..n]);
                    let response = route(&request, &metrics);
                    if let Err(e) = socket.write_all(response.as_bytes()).await {
                        debug!("Failed to write metrics response to {}: {}", peer, e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Failed to read from metrics socket {}: {}", peer, e);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.rooms_active.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.captures.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = Metrics::new();
        metrics.rooms_active.store(3, Ordering::Relaxed);
        Metrics::incr(&metrics.captures);
        Metrics::add(&metrics.moves_accepted, 40);

        let output = metrics.to_prometheus();

        assert!(output.contains("chase_arena_rooms_active 3"));
        assert!(output.contains("chase_arena_captures_total 1"));
        assert!(output.contains("chase_arena_moves_accepted_total 40"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_json_format() {
        let metrics = Metrics::new();
        metrics.players_connected.store(7, Ordering::Relaxed);

        let value: serde_json::Value = serde_json::from_str(&metrics.to_json()).unwrap();
        assert_eq!(value["rooms"]["players"], 7);
        assert!(value["network"].is_object());
    }

    #[cfg(feature = "metrics_extended")]
    #[test]
    fn test_record_handle_time() {
        let metrics = Metrics::new();
        for i in 0..100 {
            metrics.record_handle_time(Duration::from_micros(10 + i));
        }
        assert!(metrics.handle_time_p95_us.load(Ordering::Relaxed) >= 100);
        assert_eq!(metrics.handle_time_max_us.load(Ordering::Relaxed), 109);
    }

    #[test]
    fn test_routes() {
        let metrics = Metrics::new();
        assert!(route("GET /metrics HTTP/1.1\r\n\r\n", &metrics).contains("chase_arena_uptime_seconds"));
        assert!(route("GET /metrics/json HTTP/1.1\r\n\r\n", &metrics).contains("application/json"));
        assert!(route("GET /health HTTP/1.1\r\n\r\n", &metrics).ends_with("OK"));
        assert!(route("POST /metrics HTTP/1.1\r\n\r\n", &metrics).starts_with("HTTP/1.1 404"));
    }
}
