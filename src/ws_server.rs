// WebSocket broadcaster pushing draft events to connected UI clients.

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use crate::events::DraftEvent;

/// Run the WebSocket broadcast server on the given port.
///
/// Binds a TCP listener on `127.0.0.1:{port}` and accepts any number of
/// concurrent clients. Each client gets its own broadcast receiver and a
/// forwarding task; slow clients lag independently without affecting
/// others. The server runs forever (until the task is cancelled or the
/// process exits).
pub async fn run(port: u16, events: broadcast::Sender<DraftEvent>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    let local_addr = listener.local_addr()?;
    info!("WebSocket event server listening on {local_addr}");

    loop {
        let (stream, addr) = listener.accept().await?;
        let addr_str = addr.to_string();
        info!("Accepted event subscriber from {addr_str}");

        let rx = events.subscribe();
        tokio::spawn(async move {
            let ws_stream = match tokio_tungstenite::accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    warn!("WebSocket handshake failed for {addr_str}: {e}");
                    return;
                }
            };

            let (write, _read) = ws_stream.split();
            if let Err(e) = forward_events(rx, write).await {
                warn!("event forwarding to {addr_str} stopped: {e}");
            }
            info!("Event subscriber {addr_str} disconnected");
        });
    }
}

/// Serialize a draft event into a WebSocket text message.
pub fn event_message(event: &DraftEvent) -> anyhow::Result<Message> {
    let json = serde_json::to_string(event)?;
    Ok(Message::Text(json.into()))
}

/// Forward events from a broadcast receiver into any message sink until
/// either side closes. Lagged receivers skip ahead with a warning rather
/// than terminating; notification delivery is best-effort.
///
/// Generic over the sink so the forwarding logic is testable with
/// in-memory sinks, no TCP ports involved.
pub async fn forward_events<W>(
    mut rx: broadcast::Receiver<DraftEvent>,
    mut write: W,
) -> anyhow::Result<()>
where
    W: Sink<Message> + Unpin,
    W::Error: std::fmt::Display,
{
    loop {
        match rx.recv().await {
            Ok(event) => {
                let msg = event_message(&event)?;
                if let Err(e) = write.send(msg).await {
                    warn!("client sink closed: {e}");
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "slow event subscriber lagged, skipping ahead");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    Ok(())
}
