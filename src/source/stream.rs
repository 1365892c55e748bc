//! Stream-based page source.
//!
//! Receives page snapshots from an async byte stream as newline-delimited
//! JSON, one complete page per line.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{PageSource, PageSnapshot, SourceEvent};

type SharedError = Arc<Mutex<Option<String>>>;

fn set_error(slot: &SharedError, error: Option<String>) {
    if let Ok(mut guard) = slot.lock() {
        *guard = error;
    }
}

/// Why a reader stopped producing snapshots.
enum StreamEnd {
    Closed,
    ReceiverGone,
}

/// Forward every snapshot line of `reader` to `tx` until the stream ends.
async fn pump<R>(reader: R, tx: &mpsc::Sender<SourceEvent>, error: &SharedError) -> StreamEnd
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                set_error(error, Some("Connection closed".to_string()));
                return StreamEnd::Closed;
            }
            Ok(_) => {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<PageSnapshot>(line.trim()) {
                    Ok(snapshot) => {
                        set_error(error, None);
                        if tx.send(SourceEvent::Snapshot(snapshot)).await.is_err() {
                            return StreamEnd::ReceiverGone;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "skipping malformed page line");
                        set_error(error, Some(format!("Parse error: {}", e)));
                    }
                }
            }
            Err(e) => {
                set_error(error, Some(format!("Read error: {}", e)));
                return StreamEnd::Closed;
            }
        }
    }
}

/// A page source fed by a background task reading an async stream.
///
/// # Example with a byte stream
///
/// ```
/// use std::io::Cursor;
/// use checkview::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = b"{}\n";
/// let stream = Cursor::new(data.to_vec());
/// let source = StreamSource::spawn(stream, "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<SourceEvent>,
    description: String,
    last_error: SharedError,
}

impl StreamSource {
    fn with_channel(receiver: mpsc::Receiver<SourceEvent>, description: String, last_error: SharedError) -> Self {
        Self {
            receiver,
            description,
            last_error,
        }
    }

    /// Spawn a background task that reads snapshots from `reader` until EOF.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        let last_error: SharedError = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();

        tokio::spawn(async move {
            pump(reader, &tx, &error_handle).await;
        });

        Self::with_channel(rx, format!("stream: {}", description), last_error)
    }

    /// Connect to a TCP page server, reconnecting after every interruption.
    ///
    /// Each successful reconnect is reported as [`SourceEvent::Reconnected`]
    /// before the first snapshot of the new connection.
    pub fn connect(addr: &str, retry_delay: Duration) -> Self {
        let (tx, rx) = mpsc::channel(16);
        let last_error: SharedError = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();
        let target = addr.to_string();

        tokio::spawn(async move {
            let mut connected_before = false;
            loop {
                match TcpStream::connect(&target).await {
                    Ok(stream) => {
                        info!(addr = %target, "connected to page server");
                        set_error(&error_handle, None);
                        if connected_before && tx.send(SourceEvent::Reconnected).await.is_err() {
                            break;
                        }
                        connected_before = true;
                        if let StreamEnd::ReceiverGone = pump(stream, &tx, &error_handle).await {
                            break;
                        }
                        warn!(addr = %target, "page server connection lost");
                    }
                    Err(e) => {
                        debug!(addr = %target, error = %e, "connect failed");
                        set_error(&error_handle, Some(format!("Connect error: {}", e)));
                    }
                }
                if tx.is_closed() {
                    break;
                }
                tokio::time::sleep(retry_delay).await;
            }
        });

        Self::with_channel(rx, format!("tcp: {}", addr), last_error)
    }
}

impl PageSource for StreamSource {
    fn poll(&mut self) -> Option<SourceEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                let mut slot = self.last_error.lock().ok()?;
                if slot.is_none() {
                    *slot = Some("Stream disconnected".to_string());
                }
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.lock().ok()?.clone()
    }
}
