use std::thread;

use anyhow::Result;
use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use tungstenite::Message;

/// What the background feed thread reports back to the UI.
pub enum FeedEvent {
    Connected,
    /// One raw message from the server, hopefully a JSON batch of vehicle records
    Batch(String),
    /// The server hung up. There's no reconnect; the viewer keeps showing the last state.
    Disconnected,
    /// The connection never came up at all
    Unavailable(String),
}

/// Open the websocket on a background thread. Events cross back to the UI thread over a
/// channel that the event loop polls every pass.
pub fn spawn(url: String) -> UnboundedReceiver<FeedEvent> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        if let Err(err) = run(&url, &tx) {
            let _ = tx.unbounded_send(FeedEvent::Unavailable(err.to_string()));
        }
    });
    rx
}

fn run(url: &str, tx: &UnboundedSender<FeedEvent>) -> Result<()> {
    let (mut socket, _) = tungstenite::connect(url)?;
    let _ = tx.unbounded_send(FeedEvent::Connected);

    loop {
        match socket.read() {
            Ok(Message::Text(raw)) => {
                if tx.unbounded_send(FeedEvent::Batch(raw)).is_err() {
                    // The UI is gone; nothing left to do
                    return Ok(());
                }
            }
            Ok(Message::Close(_)) | Err(_) => {
                let _ = tx.unbounded_send(FeedEvent::Disconnected);
                return Ok(());
            }
            // Pings are answered by the library. Binary frames aren't part of this feed.
            Ok(_) => {}
        }
    }
}
