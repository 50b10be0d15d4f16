// Transport session - Reconnecting duplex link to the bridge
use crate::application::ports::{CommandSink, SessionControl};
use crate::infrastructure::protocol::ClientCommand;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// No connection attempts are made.
    Offline,
    /// Connect, and reconnect after every failure or drop.
    Online,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    /// `new_disconnect` is only set for the first close of an outage.
    Close { new_disconnect: bool },
    Message(String),
}

/// Opens one connection to the bridge.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self) -> anyhow::Result<Box<dyn Link>>;
}

/// One open connection.
#[async_trait]
pub trait Link: Send {
    /// Next inbound text frame, or `None` once the connection is gone.
    async fn recv(&mut self) -> Option<String>;

    async fn send(&mut self, text: String) -> anyhow::Result<()>;

    async fn close(&mut self);
}

/// Cheap handle used by the client to steer the session and send commands.
#[derive(Clone)]
pub struct TransportHandle {
    mode: Arc<watch::Sender<SessionMode>>,
    connected: Arc<AtomicBool>,
    outbound: mpsc::UnboundedSender<String>,
}

impl TransportHandle {
    /// Offline to Online. Returns false if already Online.
    pub fn connect(&self) -> bool {
        self.set_mode(SessionMode::Online)
    }

    /// Stops reconnecting and closes any open connection.
    pub fn disconnect(&self) -> bool {
        self.set_mode(SessionMode::Offline)
    }

    fn set_mode(&self, mode: SessionMode) -> bool {
        let changed = self.mode.send_if_modified(|current| {
            if *current == mode {
                return false;
            }
            *current = mode;
            true
        });
        if changed {
            tracing::info!("Transport mode set to {:?}", mode);
        }
        changed
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Queues a text frame. Returns false when nothing is connected.
    pub fn send_text(&self, text: String) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.outbound.send(text).is_ok()
    }
}

impl CommandSink for TransportHandle {
    fn send(&mut self, command: &ClientCommand) -> bool {
        let sent = self.send_text(command.to_json());
        if !sent {
            tracing::debug!("Dropped {:?}; not connected", command);
        }
        sent
    }

    fn is_connected(&self) -> bool {
        TransportHandle::is_connected(self)
    }
}

impl SessionControl for TransportHandle {
    fn go_online(&mut self) -> bool {
        self.connect()
    }

    fn go_offline(&mut self) -> bool {
        self.disconnect()
    }
}

enum PumpEnd {
    Dropped,
    Offline,
    Shutdown,
}

/// The task side of the session. Drive it with [`TransportSession::run`].
pub struct TransportSession<C> {
    connector: C,
    reconnect_delay: Duration,
    mode: watch::Receiver<SessionMode>,
    connected: Arc<AtomicBool>,
    outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::Sender<TransportEvent>,
}

/// Builds a session, its handle, and the event stream it feeds.
pub fn session<C: Connector>(
    connector: C,
    initial: SessionMode,
    reconnect_delay: Duration,
) -> (
    TransportHandle,
    TransportSession<C>,
    mpsc::Receiver<TransportEvent>,
) {
    let (mode_tx, mode_rx) = watch::channel(initial);
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::channel(100);
    let connected = Arc::new(AtomicBool::new(false));

    let handle = TransportHandle {
        mode: Arc::new(mode_tx),
        connected: connected.clone(),
        outbound: outbound_tx,
    };
    let session = TransportSession {
        connector,
        reconnect_delay,
        mode: mode_rx,
        connected,
        outbound: outbound_rx,
        events: events_tx,
    };
    (handle, session, events_rx)
}

impl<C: Connector> TransportSession<C> {
    /// Runs until every handle or the event receiver is dropped.
    pub async fn run(mut self) {
        let mut outage_announced = false;

        loop {
            if !wait_for_mode(&mut self.mode, SessionMode::Online).await {
                return;
            }

            let attempt = tokio::select! {
                result = self.connector.connect() => Some(result),
                _ = wait_for_mode(&mut self.mode, SessionMode::Offline) => None,
            };

            match attempt {
                Some(Ok(link)) => {
                    tracing::info!("Connected to bridge");
                    outage_announced = false;
                    // Frames queued just before the last drop are stale.
                    while self.outbound.try_recv().is_ok() {}
                    self.connected.store(true, Ordering::SeqCst);
                    if self.events.send(TransportEvent::Open).await.is_err() {
                        return;
                    }

                    let end = self.pump(link).await;
                    self.connected.store(false, Ordering::SeqCst);
                    if let PumpEnd::Shutdown = end {
                        return;
                    }
                }
                Some(Err(e)) if outage_announced => {
                    tracing::debug!("Reconnect failed: {:#}", e);
                }
                Some(Err(e)) => {
                    tracing::warn!("Could not reach bridge: {:#}", e);
                }
                None => tracing::debug!("Connect attempt abandoned; going offline"),
            }

            let online = *self.mode.borrow() == SessionMode::Online;
            let new_disconnect = online && !outage_announced;
            if online {
                outage_announced = true;
            }
            if self
                .events
                .send(TransportEvent::Close { new_disconnect })
                .await
                .is_err()
            {
                return;
            }

            if online {
                tokio::select! {
                    _ = tokio::time::sleep(self.reconnect_delay) => {}
                    _ = wait_for_mode(&mut self.mode, SessionMode::Offline) => {}
                }
            }
        }
    }

    async fn pump(&mut self, mut link: Box<dyn Link>) -> PumpEnd {
        loop {
            tokio::select! {
                inbound = link.recv() => match inbound {
                    Some(text) => {
                        if self.events.send(TransportEvent::Message(text)).await.is_err() {
                            link.close().await;
                            return PumpEnd::Shutdown;
                        }
                    }
                    None => {
                        tracing::warn!("Bridge connection dropped");
                        return PumpEnd::Dropped;
                    }
                },
                Some(text) = self.outbound.recv() => {
                    if let Err(e) = link.send(text).await {
                        tracing::warn!("Send to bridge failed: {:#}", e);
                        link.close().await;
                        return PumpEnd::Dropped;
                    }
                }
                _ = wait_for_mode(&mut self.mode, SessionMode::Offline) => {
                    tracing::info!("Closing bridge connection");
                    link.close().await;
                    return PumpEnd::Offline;
                }
            }
        }
    }
}

/// False once every handle is gone.
async fn wait_for_mode(mode: &mut watch::Receiver<SessionMode>, wanted: SessionMode) -> bool {
    mode.wait_for(|m| *m == wanted).await.is_ok()
}
