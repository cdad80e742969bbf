use crate::session::{Session, SyncState};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// A WebSocket connection to the server driving a [`Session`].
pub struct Client {
    ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    session: Session,
    close_reason: Option<String>,
}

impl Client {
    pub async fn connect(url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Connecting to {}...", url);
        let (ws_stream, _) = connect_async(url).await?;
        info!("Connected to {}", url);

        Ok(Client {
            ws_stream,
            session: Session::new(),
            close_reason: None,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Reason carried by the server's close frame, if it sent one.
    pub fn close_reason(&self) -> Option<&str> {
        self.close_reason.as_deref()
    }

    /// Reads and applies the next frame. Returns false once the connection
    /// has ended.
    pub async fn process_next(&mut self) -> Result<bool, Box<dyn std::error::Error>> {
        if self.session.state() == SyncState::Disconnected {
            return Ok(false);
        }

        match self.ws_stream.next().await {
            Some(Ok(Message::Text(text))) => {
                self.session.handle_frame(&text);
                Ok(true)
            }
            Some(Ok(Message::Close(frame))) => {
                if let Some(frame) = frame {
                    info!("Server closed the connection: {}", frame.reason);
                    self.close_reason = Some(frame.reason.into_owned());
                }
                self.session.disconnect();
                Ok(false)
            }
            Some(Ok(other)) => {
                debug!("Ignoring non-text frame: {:?}", other);
                Ok(true)
            }
            Some(Err(e)) => {
                self.session.disconnect();
                Err(e.into())
            }
            None => {
                self.session.disconnect();
                Ok(false)
            }
        }
    }

    /// Processes frames until `done` holds for the session or `limit` passes.
    /// Returns whether `done` was reached.
    pub async fn process_until<F>(
        &mut self,
        limit: Duration,
        mut done: F,
    ) -> Result<bool, Box<dyn std::error::Error>>
    where
        F: FnMut(&Session) -> bool,
    {
        let deadline = Instant::now() + limit;
        while !done(&self.session) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match timeout(remaining, self.process_next()).await {
                Ok(result) => {
                    if !result? {
                        return Ok(done(&self.session));
                    }
                }
                Err(_) => {
                    warn!("Timed out waiting on the server");
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    pub async fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.ws_stream.close(None).await?;
        self.session.disconnect();
        Ok(())
    }
}
