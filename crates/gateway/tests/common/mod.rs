//! In-process exchange socket for integration tests

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use okws_gateway::ClientConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

enum Command {
    Send(String),
    Drop,
}

/// Accepts any number of connections; records every non-ping text frame
/// with the index of the connection it arrived on
pub struct MockExchange {
    pub url: String,
    frames: mpsc::UnboundedReceiver<(usize, String)>,
    connections: Arc<Mutex<Vec<mpsc::UnboundedSender<Command>>>>,
    pings: Arc<AtomicUsize>,
    dials: Arc<AtomicUsize>,
    /// Milliseconds to hold each TCP connection before the handshake
    accept_delay_ms: Arc<AtomicU64>,
    accept_task: JoinHandle<()>,
}

impl MockExchange {
    pub async fn start() -> Self {
        Self::start_with(true).await
    }

    /// `auto_pong` answers every `ping` with `pong`
    pub async fn start_with(auto_pong: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock exchange");
        let url = format!("ws://{}", listener.local_addr().expect("local addr"));

        let (frame_tx, frames) = mpsc::unbounded_channel();
        let connections: Arc<Mutex<Vec<mpsc::UnboundedSender<Command>>>> = Arc::default();
        let pings = Arc::new(AtomicUsize::new(0));
        let dials = Arc::new(AtomicUsize::new(0));
        let accept_delay_ms = Arc::new(AtomicU64::new(0));

        let accept_task = {
            let connections = connections.clone();
            let pings = pings.clone();
            let dials = dials.clone();
            let accept_delay_ms = accept_delay_ms.clone();
            tokio::spawn(async move {
                while let Ok((tcp, _)) = listener.accept().await {
                    dials.fetch_add(1, Ordering::SeqCst);
                    let delay = accept_delay_ms.load(Ordering::SeqCst);
                    if delay > 0 {
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    }
                    let Ok(ws) = accept_async(tcp).await else {
                        continue;
                    };
                    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
                    let idx = {
                        let mut conns = connections.lock();
                        conns.push(cmd_tx);
                        conns.len() - 1
                    };
                    let frame_tx = frame_tx.clone();
                    let pings = pings.clone();

                    tokio::spawn(async move {
                        let (mut sink, mut stream) = ws.split();
                        loop {
                            tokio::select! {
                                cmd = cmd_rx.recv() => match cmd {
                                    Some(Command::Send(text)) => {
                                        if sink.send(Message::Text(text.into())).await.is_err() {
                                            break;
                                        }
                                    }
                                    Some(Command::Drop) | None => break,
                                },
                                msg = stream.next() => match msg {
                                    Some(Ok(Message::Text(text))) if text.as_str() == "ping" => {
                                        pings.fetch_add(1, Ordering::SeqCst);
                                        if auto_pong
                                            && sink.send(Message::Text("pong".into())).await.is_err()
                                        {
                                            break;
                                        }
                                    }
                                    Some(Ok(Message::Text(text))) => {
                                        let _ = frame_tx.send((idx, text.as_str().to_string()));
                                    }
                                    Some(Ok(_)) => {}
                                    Some(Err(_)) | None => break,
                                },
                            }
                        }
                        // dropping both halves closes the TCP stream without a close frame
                    });
                }
            })
        };

        Self {
            url,
            frames,
            connections,
            pings,
            dials,
            accept_delay_ms,
            accept_task,
        }
    }

    /// Client config pointing both sessions here, with fast redial
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::default().with_urls(&self.url, &self.url);
        config.redial_min_delay_ms = 10;
        config.redial_max_delay_ms = 50;
        config
    }

    /// Next text frame sent by a client, as `(connection index, text)`
    pub async fn next_frame(&mut self) -> (usize, String) {
        timeout(Duration::from_secs(5), self.frames.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("mock exchange stopped")
    }

    /// Next frame parsed as JSON
    pub async fn next_op(&mut self) -> (usize, serde_json::Value) {
        let (idx, text) = self.next_frame().await;
        let value = serde_json::from_str(&text).expect("client sent invalid JSON");
        (idx, value)
    }

    /// Whether any frame arrives within `wait`
    pub async fn quiet_for(&mut self, wait: Duration) -> bool {
        timeout(wait, self.frames.recv()).await.is_err()
    }

    /// Send `text` on the most recent connection
    pub fn push(&self, text: &str) {
        let conns = self.connections.lock();
        let conn = conns.last().expect("no client connected");
        let _ = conn.send(Command::Send(text.to_string()));
    }

    /// Abruptly close the most recent connection
    pub fn drop_connection(&self) {
        if let Some(conn) = self.connections.lock().last() {
            let _ = conn.send(Command::Drop);
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn ping_count(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    /// TCP connections accepted, including ones still waiting on the handshake
    pub fn dial_count(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    /// Hold every later connection for `delay` before completing its handshake
    pub fn set_accept_delay(&self, delay: Duration) {
        self.accept_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Drop for MockExchange {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

/// URL on which nothing listens
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("ws://{addr}")
}

/// Poll `cond` every 10ms for up to 5s
pub async fn eventually<F: Fn() -> bool>(cond: F) -> bool {
    for _ in 0..500 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
