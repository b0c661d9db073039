//! Socket transport.
//!
//! A long-lived service object owning the websocket connection to the
//! overlay server. Incoming frames are validated into [`ServerEvent`]s and
//! fanned out to registered handlers; outgoing [`ClientCommand`]s are
//! queued and flushed while connected. The connection task reconnects with
//! capped exponential backoff and drops stale sessions via heartbeat.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Bytes, Message};
use tokio_util::sync::CancellationToken;

use crate::config::TransportConfig;
use crate::events::{ClientCommand, EventKind, ServerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Reconnecting,
    /// Retries exhausted or torn down; no further attempts.
    Disconnected,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Reconnecting => "reconnecting",
            ConnectionStatus::Disconnected => "disconnected",
        }
    }
}

type Handler = Box<dyn Fn(&ServerEvent) + Send>;

/// Handle returned by [`SocketClient::on`]; detaches its handler when
/// explicitly unsubscribed.
pub struct Subscription {
    id: u64,
    kind: EventKind,
    inner: Weak<Inner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.remove_handler(self.kind, self.id);
        }
    }
}

struct Inner {
    cfg: TransportConfig,
    registry: Mutex<HashMap<EventKind, Vec<(u64, Handler)>>>,
    next_id: AtomicU64,
    cancel: CancellationToken,
    status_tx: watch::Sender<ConnectionStatus>,
}

impl Inner {
    fn set_status(&self, status: ConnectionStatus) {
        let previous = self.status_tx.send_replace(status);
        if previous != status {
            tracing::info!(status = status.label(), "transport status");
        }
    }

    /// Parses one frame and fans it out. Unknown or malformed frames have
    /// already been dropped by the parse step.
    fn dispatch(&self, text: &str) {
        let Some(event) = ServerEvent::parse(text) else {
            return;
        };
        let kind = event.kind();
        let registry = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handlers) = registry.get(&kind) {
            for (_, handler) in handlers {
                handler(&event);
            }
        }
    }

    fn remove_handler(&self, kind: EventKind, id: u64) {
        let mut registry = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handlers) = registry.get_mut(&kind) {
            handlers.retain(|(handler_id, _)| *handler_id != id);
        }
    }
}

pub struct SocketClient {
    inner: Arc<Inner>,
    outbound_tx: mpsc::UnboundedSender<ClientCommand>,
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<ClientCommand>>>,
}

impl SocketClient {
    pub fn new(cfg: TransportConfig) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(ConnectionStatus::Connecting);
        SocketClient {
            inner: Arc::new(Inner {
                cfg,
                registry: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                cancel: CancellationToken::new(),
                status_tx,
            }),
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
        }
    }

    /// Registers a handler for one event kind.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&ServerEvent) + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut registry = self
            .inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        registry.entry(kind).or_default().push((id, Box::new(handler)));
        Subscription {
            id,
            kind,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Registers the same handler for every event kind.
    pub fn on_all<F>(&self, handler: F) -> Vec<Subscription>
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        EventKind::all()
            .iter()
            .map(|kind| {
                let handler = Arc::clone(&handler);
                self.on(*kind, move |event| handler(event))
            })
            .collect()
    }

    /// Queues a command; it is flushed while a session is up.
    pub fn send(&self, command: ClientCommand) -> Result<()> {
        self.outbound_tx
            .send(command)
            .context("transport task is gone")
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status_tx.subscribe()
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status_tx.borrow()
    }

    /// Spawns the connection task on the current tokio runtime.
    pub fn connect(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.inner.cfg.url)
            .with_context(|| format!("invalid transport url: {}", self.inner.cfg.url))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            bail!("transport url must use ws:// or wss://");
        }
        let receiver = self
            .outbound_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(outbound_rx) = receiver else {
            bail!("transport already connected");
        };
        let inner = Arc::clone(&self.inner);
        tokio::spawn(run_connection(inner, outbound_rx));
        Ok(())
    }

    /// Stops the connection task and drops every handler. Nothing fires
    /// after this returns.
    pub fn teardown(&self) {
        self.inner.cancel.cancel();
        self.inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.inner.set_status(ConnectionStatus::Disconnected);
    }
}

impl Drop for SocketClient {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

async fn run_connection(inner: Arc<Inner>, mut outbound_rx: mpsc::UnboundedReceiver<ClientCommand>) {
    let mut attempt: u32 = 0;
    loop {
        if inner.cancel.is_cancelled() {
            break;
        }
        inner.set_status(if attempt == 0 {
            ConnectionStatus::Connecting
        } else {
            ConnectionStatus::Reconnecting
        });

        match connect_async(inner.cfg.url.as_str()).await {
            Ok((stream, _)) => {
                tracing::info!(url = %inner.cfg.url, "transport connected");
                attempt = 0;
                inner.set_status(ConnectionStatus::Connected);
                match run_session(&inner, stream, &mut outbound_rx).await {
                    Ok(()) => break,
                    Err(err) => tracing::warn!(%err, "transport session ended"),
                }
            }
            Err(err) => {
                tracing::warn!(url = %inner.cfg.url, %err, "transport connect failed");
            }
        }

        if inner.cancel.is_cancelled() {
            break;
        }
        attempt += 1;
        if inner.cfg.max_reconnect_attempts > 0 && attempt > inner.cfg.max_reconnect_attempts {
            tracing::warn!(attempt, "transport retries exhausted");
            inner.set_status(ConnectionStatus::Disconnected);
            return;
        }
        let delay = backoff_delay(attempt, inner.cfg.reconnect_base(), inner.cfg.reconnect_cap());
        tokio::select! {
            () = inner.cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }
    inner.set_status(ConnectionStatus::Disconnected);
}

/// One connected session. Returns `Ok` only on teardown; any disconnect
/// or staleness is an error so the caller reconnects.
async fn run_session(
    inner: &Inner,
    stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    outbound_rx: &mut mpsc::UnboundedReceiver<ClientCommand>,
) -> Result<()> {
    let (mut sink, mut stream) = stream.split();

    let mut heartbeat = tokio::time::interval(inner.cfg.heartbeat_interval());
    let mut last_rx = Instant::now();

    loop {
        tokio::select! {
            () = inner.cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return Ok(());
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    last_rx = Instant::now();
                    inner.dispatch(text.as_str());
                }
                Some(Ok(Message::Ping(payload))) => {
                    last_rx = Instant::now();
                    sink.send(Message::Pong(payload)).await?;
                }
                Some(Ok(Message::Pong(_))) => {
                    last_rx = Instant::now();
                }
                Some(Ok(Message::Close(_))) | None => bail!("closed by server"),
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
            },
            command = outbound_rx.recv() => {
                if let Some(command) = command {
                    let text = serde_json::to_string(&command)?;
                    sink.send(Message::Text(text.into())).await?;
                }
            }
            _ = heartbeat.tick() => {
                if last_rx.elapsed() > inner.cfg.heartbeat_timeout() {
                    bail!("heartbeat timed out");
                }
                sink.send(Message::Ping(Bytes::new())).await?;
            }
        }
    }
}

/// Exponential backoff, doubling from `base` and capped at `cap`.
fn backoff_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let shift = attempt.saturating_sub(1).min(16);
    base.saturating_mul(1_u32 << shift).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn client() -> SocketClient {
        SocketClient::new(TransportConfig::default())
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let base = Duration::from_millis(500);
        let cap = Duration::from_secs(30);
        assert_eq!(backoff_delay(1, base, cap), Duration::from_millis(500));
        assert_eq!(backoff_delay(2, base, cap), Duration::from_secs(1));
        assert_eq!(backoff_delay(3, base, cap), Duration::from_secs(2));
        assert_eq!(backoff_delay(7, base, cap), Duration::from_secs(30));
        assert_eq!(backoff_delay(40, base, cap), Duration::from_secs(30));
    }

    #[test]
    fn test_dispatch_routes_by_kind() {
        let client = client();
        let transcripts = Arc::new(AtomicUsize::new(0));
        let winners = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&transcripts);
        let _sub = client.on(EventKind::Transcript, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&winners);
        let _sub = client.on(EventKind::LotteryWinner, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        client.inner.dispatch(r#"{"type":"transcript","text":"hi"}"#);
        client.inner.dispatch(r#"{"type":"transcript","text":"again"}"#);
        client.inner.dispatch(r#"{"type":"lottery_winner","winner":"ada"}"#);

        assert_eq!(transcripts.load(Ordering::SeqCst), 2);
        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_malformed_frames_dropped() {
        let client = client();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let _sub = client.on(EventKind::Transcript, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        client.inner.dispatch("not json");
        client.inner.dispatch(r#"{"type":"unknown_event"}"#);
        client.inner.dispatch(r#"{"type":"transcript"}"#);
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_detaches_handler() {
        let client = client();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let sub = client.on(EventKind::LotteryStarted, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        client.inner.dispatch(r#"{"type":"lottery_started"}"#);
        sub.unsubscribe();
        client.inner.dispatch(r#"{"type":"lottery_started"}"#);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_on_all_sees_every_kind() {
        let client = client();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let _subs = client.on_all(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        client.inner.dispatch(r#"{"type":"lottery_stopped"}"#);
        client.inner.dispatch(r#"{"type":"transcript","text":"hi","is_interim":true}"#);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_teardown_clears_registry_and_status() {
        let client = client();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let _sub = client.on(EventKind::Transcript, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        client.teardown();
        client.inner.dispatch(r#"{"type":"transcript","text":"late"}"#);
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert_eq!(client.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_send_queues_before_connect() {
        let client = client();
        assert!(client.send(ClientCommand::hello()).is_ok());
    }

    #[test]
    fn test_connect_rejects_bad_url() {
        let client = SocketClient::new(TransportConfig {
            url: "http://127.0.0.1:8790/overlay".to_string(),
            ..TransportConfig::default()
        });
        assert!(client.connect().is_err());

        let client = SocketClient::new(TransportConfig {
            url: "not a url".to_string(),
            ..TransportConfig::default()
        });
        assert!(client.connect().is_err());
    }
}
