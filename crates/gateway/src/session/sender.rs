//! Write half of one connection epoch

use crate::error::TransportError;
use futures_util::{Sink, SinkExt};
use log::{debug, trace, warn};
use okws_core::wire::PING;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at, timeout};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

/// How a send task ended. The queue goes back to the session so the next
/// epoch keeps draining the same channel.
#[derive(Debug)]
pub(crate) struct EpochEnd {
    pub error: Option<TransportError>,
    pub queue: mpsc::Receiver<String>,
}

async fn write<S>(sink: &mut S, text: String, write_wait: Duration) -> Result<(), TransportError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    match timeout(write_wait, sink.send(Message::Text(text.into()))).await {
        Ok(result) => result.map_err(TransportError::from),
        Err(_) => Err(TransportError::WriteTimeout(write_wait)),
    }
}

/// Write queued operations and a keepalive ping every `ping_period`.
/// Exits on the first write failure or when the epoch is cancelled; a failed
/// write is never retried.
pub(crate) async fn run<S>(
    label: &'static str,
    mut sink: S,
    mut queue: mpsc::Receiver<String>,
    write_wait: Duration,
    ping_period: Duration,
    epoch: CancellationToken,
) -> EpochEnd
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let mut ping = interval_at(Instant::now() + ping_period, ping_period);

    let error = loop {
        tokio::select! {
            biased;
            _ = epoch.cancelled() => break None,
            op = queue.recv() => {
                let Some(text) = op else {
                    break Some(TransportError::ChannelClosed);
                };
                trace!("{label} -> {text}");
                if let Err(e) = write(&mut sink, text, write_wait).await {
                    break Some(e);
                }
            }
            _ = ping.tick() => {
                trace!("{label} -> {PING}");
                if let Err(e) = write(&mut sink, PING.to_string(), write_wait).await {
                    break Some(e);
                }
            }
        }
    };

    if let Some(e) = &error {
        warn!("{label} send loop failed: {e}");
    }
    epoch.cancel();
    if timeout(write_wait, sink.close()).await.is_err() {
        debug!("{label} close handshake timed out");
    }

    EpochEnd { error, queue }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::sink;
    use std::sync::{Arc, Mutex};

    fn recording_sink(
        log: Arc<Mutex<Vec<String>>>,
    ) -> impl Sink<Message, Error = tungstenite::Error> + Unpin {
        Box::pin(sink::unfold(log, |log, msg: Message| async move {
            if let Message::Text(text) = &msg {
                log.lock().unwrap().push(text.to_string());
            }
            Ok::<_, tungstenite::Error>(log)
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_in_order_and_pings() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::channel(3);
        let epoch = CancellationToken::new();
        let task = tokio::spawn(run(
            "test",
            recording_sink(log.clone()),
            rx,
            Duration::from_secs(3),
            Duration::from_secs(24),
            epoch.clone(),
        ));

        tx.send("a".to_string()).await.unwrap();
        tx.send("b".to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_secs(25)).await;
        epoch.cancel();

        let end = task.await.unwrap();
        assert!(end.error.is_none());
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "ping"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failure_ends_epoch() {
        let failing = Box::pin(sink::unfold((), |_, _msg: Message| async move {
            Err::<(), _>(tungstenite::Error::ConnectionClosed)
        }));
        let (tx, rx) = mpsc::channel(3);
        let epoch = CancellationToken::new();
        tx.send("a".to_string()).await.unwrap();
        tx.send("b".to_string()).await.unwrap();

        let end = run("test", failing, rx, Duration::from_secs(3), Duration::from_secs(24), epoch.clone()).await;
        assert!(matches!(end.error, Some(TransportError::Connection(_))));
        assert!(epoch.is_cancelled());
        // the unwritten op is handed back with the queue
        let mut queue = end.queue;
        assert_eq!(queue.try_recv().unwrap(), "b");
    }
}
