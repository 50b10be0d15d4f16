// WebSocket connector - tokio-tungstenite link to the bridge server
use crate::infrastructure::transport::{Connector, Link};
use anyhow::Context;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> anyhow::Result<Box<dyn Link>> {
        tracing::debug!("Connecting to {}", self.url);
        let (stream, _) = connect_async(self.url.as_str())
            .await
            .with_context(|| format!("connecting to {}", self.url))?;
        Ok(Box::new(WsLink { stream }))
    }
}

pub struct WsLink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Link for WsLink {
    async fn recv(&mut self) -> Option<String> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(text.to_string()),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Some(text),
                    Err(_) => tracing::warn!("Ignoring non-UTF-8 binary frame"),
                },
                Ok(Message::Close(frame)) => {
                    tracing::debug!("Bridge closed the connection: {:?}", frame);
                    return None;
                }
                // Ping/pong are answered by tungstenite itself.
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return None;
                }
            }
        }
        None
    }

    async fn send(&mut self, text: String) -> anyhow::Result<()> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .context("writing to bridge")
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!("Error closing WebSocket: {}", e);
        }
    }
}
