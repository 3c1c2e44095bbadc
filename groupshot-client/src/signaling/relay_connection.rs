use crate::error::ClientError;
use crate::signaling::SignalTransport;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info};

/// The one WebSocket to the relay, shared by signaling and room
/// lifecycle. Created at session start, closed explicitly at session end;
/// when it goes, the session goes with it.
pub struct RelayConnection {
    tx: mpsc::UnboundedSender<Message>,
}

impl RelayConnection {
    /// Connect and return the live handle plus the raw inbound frames.
    /// The receiver ends when the relay closes the socket; there is no
    /// automatic reconnect.
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<String>), ClientError> {
        info!("Connecting to relay: {}", url);
        let (ws_stream, _) = connect_async(url).await?;
        info!("Relay connection established");

        let (mut write, mut read) = ws_stream.split();
        let (tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if write.send(msg).await.is_err() {
                    error!("Relay send failed, abandoning outbound frames");
                    break;
                }
                if closing {
                    break;
                }
            }
            debug!("Relay sender task finished");
        });

        tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        if inbound_tx.send(text.to_string()).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        info!("Relay closed the connection");
                        break;
                    }
                    Err(e) => {
                        error!("Relay connection error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
            debug!("Relay receiver task finished");
        });

        Ok((Self { tx }, inbound_rx))
    }
}

impl SignalTransport for RelayConnection {
    fn send_text(&self, text: String) -> Result<(), ClientError> {
        self.tx
            .send(Message::Text(text.into()))
            .map_err(|_| ClientError::RelayClosed)
    }

    fn close(&self) {
        let _ = self.tx.send(Message::Close(None));
    }
}
