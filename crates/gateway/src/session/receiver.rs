//! Read half of one connection epoch

use crate::dispatch::Router;
use crate::error::TransportError;
use futures_util::{Stream, StreamExt};
use log::{debug, error, info, trace, warn};
use okws_core::Envelope;
use okws_core::wire::PONG;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

fn close_error(label: &str, frame: Option<CloseFrame>) -> TransportError {
    let (code, reason) = match frame {
        Some(frame) => (frame.code, frame.reason.to_string()),
        None => (CloseCode::Status, String::new()),
    };
    match code {
        CloseCode::Normal | CloseCode::Away => info!("{label} closed by peer ({code}): {reason}"),
        _ => warn!("{label} closed by peer with unexpected code {code}: {reason}"),
    }
    TransportError::Closed {
        code: code.into(),
        reason,
    }
}

/// Read frames under a deadline refreshed before every read, drop `pong`,
/// and hand every other text frame to the router. A malformed frame ends the
/// epoch like any transport failure.
pub(crate) async fn run<S>(
    label: &'static str,
    mut stream: S,
    router: Arc<Router>,
    outbound: mpsc::Sender<String>,
    pong_wait: Duration,
    epoch: CancellationToken,
) -> Option<TransportError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let error = loop {
        let next = tokio::select! {
            biased;
            _ = epoch.cancelled() => break None,
            next = timeout(pong_wait, stream.next()) => next,
        };
        let msg = match next {
            Err(_) => break Some(TransportError::ReadTimeout(pong_wait)),
            Ok(None) => break Some(TransportError::StreamEnded),
            Ok(Some(Err(e))) => break Some(e.into()),
            Ok(Some(Ok(msg))) => msg,
        };

        match msg {
            Message::Text(text) => {
                if text.as_str() == PONG {
                    trace!("{label} <- {PONG}");
                    continue;
                }
                trace!("{label} <- {}", text.as_str());
                match Envelope::from_text(text.as_str()) {
                    Ok(env) => router.route(env, &outbound),
                    Err(e) => {
                        error!("{label} malformed frame {:?}: {e}", text.as_str());
                        break Some(e.into());
                    }
                }
            }
            Message::Close(frame) => break Some(close_error(label, frame)),
            Message::Binary(data) => debug!("{label} ignoring {} byte binary frame", data.len()),
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    };

    if let Some(e) = &error {
        warn!("{label} receive loop failed: {e}");
    }
    epoch.cancel();
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::private::PrivateSinks;
    use crate::public::PublicSinks;
    use crate::sink::{ControlSinks, DeliveryStats};
    use futures_util::stream;

    fn router() -> (Arc<Router>, Arc<ControlSinks>) {
        let control = Arc::new(ControlSinks::default());
        let router = Router::new(
            control.clone(),
            Arc::new(PrivateSinks::default()),
            Arc::new(PublicSinks::default()),
            None,
            Arc::new(DeliveryStats::default()),
        );
        (Arc::new(router), control)
    }

    fn text(s: &str) -> Result<Message, tungstenite::Error> {
        Ok(Message::Text(s.to_string().into()))
    }

    #[tokio::test]
    async fn test_pong_is_discarded() {
        let (router, control) = router();
        let (err_tx, mut err_rx) = mpsc::channel(4);
        let (sub_tx, mut sub_rx) = mpsc::channel(4);
        let (ack_tx, mut ack_rx) = mpsc::channel(4);
        control.error.set(err_tx);
        control.subscribe.set(sub_tx);
        control.success.set(ack_tx);
        let (out, _out_rx) = mpsc::channel(1);

        let frames = stream::iter(vec![
            text("pong"),
            text(r#"{"event":"subscribe","arg":{"channel":"tickers","instId":"A"}}"#),
            text("pong"),
        ]);
        let err = run("test", frames, router, out, Duration::from_secs(30), CancellationToken::new()).await;

        assert!(matches!(err, Some(TransportError::StreamEnded)));
        assert_eq!(sub_rx.try_recv().unwrap().arg.get("instId"), Some("A"));
        assert!(sub_rx.try_recv().is_err());
        assert!(err_rx.try_recv().is_err());
        assert!(ack_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_frame_ends_epoch() {
        let (router, _) = router();
        let (out, _out_rx) = mpsc::channel(1);
        let epoch = CancellationToken::new();
        let frames = stream::iter(vec![text("{not json"), text("{}")]);
        let err = run("test", frames, router, out, Duration::from_secs(30), epoch.clone()).await;
        assert!(matches!(err, Some(TransportError::Protocol(_))));
        assert!(epoch.is_cancelled());
    }

    #[tokio::test]
    async fn test_close_frame() {
        let (router, _) = router();
        let (out, _out_rx) = mpsc::channel(1);
        let frames = stream::iter(vec![Ok(Message::Close(Some(CloseFrame {
            code: CloseCode::Away,
            reason: "maintenance".into(),
        })))]);
        let err = run("test", frames, router, out, Duration::from_secs(30), CancellationToken::new()).await;
        match err {
            Some(TransportError::Closed { code, reason }) => {
                assert_eq!(code, 1001);
                assert_eq!(reason, "maintenance");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_deadline() {
        let (router, _) = router();
        let (out, _out_rx) = mpsc::channel(1);
        let frames = stream::pending::<Result<Message, tungstenite::Error>>();
        let err = run("test", frames, router, out, Duration::from_secs(30), CancellationToken::new()).await;
        assert!(matches!(err, Some(TransportError::ReadTimeout(_))));
    }
}
