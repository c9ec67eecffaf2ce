//! Connection manager: one session per endpoint kind
//!
//! A session dials lazily on the first operation, runs one send task and one
//! receive task per connection epoch, and a supervisor that redials after
//! any failure and replays the last operation.
//!
//! ```text
//!   submit ──► outbound queue ──► sender ──► socket
//!                   ▲                          │
//!        relogin ───┘      router ◄── receiver ┘
//!
//!   sender/receiver end ──► supervisor: redial, drain, relogin, replay
//! ```

mod receiver;
mod sender;

use crate::auth::Authenticator;
use crate::config::ClientConfig;
use crate::dispatch::Router;
use crate::error::{GatewayError, TransportError};
use dashmap::DashSet;
use futures_util::StreamExt;
use log::{debug, error, info, warn};
use okws_core::{Arg, Operation, WsRequest};
use parking_lot::Mutex;
use rand::Rng;
use sender::EpochEnd;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{MutexGuard, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn dial(url: &str) -> Result<WsStream, TransportError> {
    let (ws, response) = connect_async(url).await?;
    debug!("Connected to {url} ({})", response.status());
    Ok(ws)
}

/// Operation currently subject to replay after a reconnect
#[derive(Debug, Clone)]
struct ActiveOp {
    req: WsRequest,
    text: String,
    /// Bumped by every submit; a replay is skipped once a newer op exists
    seq: u64,
}

/// Poll `auth` until authorized, bounded by `limit` and by `cancel`
pub(crate) async fn wait_authorized(
    auth: &Authenticator,
    poll: Duration,
    limit: Duration,
    cancel: &CancellationToken,
) -> Result<(), GatewayError> {
    let deadline = Instant::now() + limit;
    loop {
        if auth.state().is_authorized() {
            return Ok(());
        }
        if cancel.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }
        if Instant::now() >= deadline {
            return Err(GatewayError::AuthTimeout(limit));
        }
        tokio::select! {
            _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
            _ = sleep(poll) => {}
        }
    }
}

pub struct Session {
    label: &'static str,
    url: String,
    config: Arc<ClientConfig>,
    router: Arc<Router>,
    /// Present on the authenticated session only
    auth: Option<Arc<Authenticator>>,
    cancel: CancellationToken,
    /// Sending half of the outbound queue; `None` until the first dial.
    /// Held across every enqueue, so queue order matches `active` order.
    link: tokio::sync::Mutex<Option<mpsc::Sender<String>>>,
    active: Mutex<Option<ActiveOp>>,
    /// Topic arguments believed subscribed on the live connection
    subscriptions: DashSet<Arg>,
}

impl Session {
    pub(crate) fn new(
        needs_auth: bool,
        config: Arc<ClientConfig>,
        router: Arc<Router>,
        auth: Option<Arc<Authenticator>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            label: if needs_auth { "private" } else { "public" },
            url: config.url(needs_auth).to_string(),
            config,
            router,
            auth,
            cancel,
            link: tokio::sync::Mutex::new(None),
            active: Mutex::new(None),
            subscriptions: DashSet::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether a connection has been established (it may be redialing)
    pub async fn is_connected(&self) -> bool {
        self.link.lock().await.is_some()
    }

    /// Topic arguments believed subscribed on this session
    pub fn subscriptions(&self) -> Vec<Arg> {
        let mut args: Vec<Arg> = self.subscriptions.iter().map(|a| a.key().clone()).collect();
        args.sort();
        args
    }

    fn track(&self, req: &WsRequest) {
        match req.op {
            Operation::Subscribe => {
                for arg in &req.args {
                    self.subscriptions.insert(arg.clone());
                }
            }
            Operation::Unsubscribe => {
                for arg in &req.args {
                    self.subscriptions.remove(arg);
                }
            }
            Operation::Login => {}
        }
    }

    /// Send one operation, dialing first when the session has no connection.
    ///
    /// Only a failed first dial is reported; later transport failures are
    /// absorbed by the supervisor.
    pub async fn submit(self: &Arc<Self>, req: WsRequest) -> Result<(), GatewayError> {
        if self.cancel.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }
        let text = req.to_text()?;
        let mut link = self.link.lock().await;
        debug!("{} {}", self.label, req.summary());

        self.track(&req);
        {
            let mut active = self.active.lock();
            let seq = active.as_ref().map_or(0, |a| a.seq + 1);
            *active = Some(ActiveOp {
                req,
                text: text.clone(),
                seq,
            });
        }

        match link.as_ref() {
            Some(tx) => tx
                .send(text)
                .await
                .map_err(|_| GatewayError::Transport(TransportError::ChannelClosed)),
            None => {
                *link = Some(self.connect(text).await?);
                Ok(())
            }
        }
    }

    /// Dial, start the first epoch with `initial` at the head of the queue,
    /// and start the supervisor
    async fn connect(self: &Arc<Self>, initial: String) -> Result<mpsc::Sender<String>, GatewayError> {
        let ws = tokio::select! {
            _ = self.cancel.cancelled() => return Err(GatewayError::Cancelled),
            ws = dial(&self.url) => ws?,
        };
        info!("{} session connected to {}", self.label, self.url);

        let (tx, rx) = mpsc::channel(self.config.send_queue_capacity);
        tx.try_send(initial)
            .map_err(|_| GatewayError::Transport(TransportError::ChannelClosed))?;
        let (writer, reader) = self.spawn_epoch(ws, rx, tx.clone());
        tokio::spawn(Arc::clone(self).supervise(writer, reader, tx.clone()));
        Ok(tx)
    }

    fn spawn_epoch(
        &self,
        ws: WsStream,
        queue: mpsc::Receiver<String>,
        outbound: mpsc::Sender<String>,
    ) -> (JoinHandle<EpochEnd>, JoinHandle<Option<TransportError>>) {
        let epoch = self.cancel.child_token();
        let (sink, stream) = ws.split();
        let writer = tokio::spawn(sender::run(
            self.label,
            sink,
            queue,
            self.config.write_wait(),
            self.config.ping_period(),
            epoch.clone(),
        ));
        let reader = tokio::spawn(receiver::run(
            self.label,
            stream,
            Arc::clone(&self.router),
            outbound,
            self.config.pong_wait(),
            epoch,
        ));
        (writer, reader)
    }

    async fn supervise(
        self: Arc<Self>,
        mut writer: JoinHandle<EpochEnd>,
        mut reader: JoinHandle<Option<TransportError>>,
        outbound: mpsc::Sender<String>,
    ) {
        loop {
            let end = match writer.await {
                Ok(end) => end,
                Err(e) => {
                    error!("{} send task aborted: {e}", self.label);
                    reader.abort();
                    self.link.lock().await.take();
                    return;
                }
            };
            let read_error = reader.await.ok().flatten();

            if self.cancel.is_cancelled() {
                info!("{} session stopped", self.label);
                return;
            }
            match end.error.as_ref().or(read_error.as_ref()) {
                Some(e) => warn!("{} connection lost: {e}", self.label),
                None => warn!("{} connection lost", self.label),
            }
            if let Some(auth) = &self.auth {
                auth.state().reset();
            }

            let Some(ws) = self.redial().await else {
                info!("{} session stopped while redialing", self.label);
                return;
            };

            let mut queue = end.queue;
            let link = self.lock_draining(&mut queue).await;
            let replay = self.active.lock().clone();
            self.subscriptions.clear();

            (writer, reader) = self.spawn_epoch(ws, queue, outbound.clone());
            self.resume(link, replay, &outbound).await;
        }
    }

    /// Take the link lock while discarding unsent operations. A submit
    /// blocked on the full queue holds the lock, so the queue keeps being
    /// drained until it lets go.
    async fn lock_draining(
        &self,
        queue: &mut mpsc::Receiver<String>,
    ) -> MutexGuard<'_, Option<mpsc::Sender<String>>> {
        let mut stale = 0;
        let link = loop {
            tokio::select! {
                biased;
                link = self.link.lock() => break link,
                Some(_) = queue.recv() => stale += 1,
            }
        };
        while queue.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            debug!("{} discarded {stale} unsent operations", self.label);
        }
        link
    }

    /// Redial with jittered exponential backoff until connected or cancelled
    async fn redial(&self) -> Option<WsStream> {
        let min = self.config.redial_min_delay();
        let max = self.config.redial_max_delay();
        let mut delay = min;
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let result = tokio::select! {
                _ = self.cancel.cancelled() => return None,
                result = dial(&self.url) => result,
            };
            match result {
                Ok(ws) => {
                    info!("{} session reconnected after {attempt} attempt(s)", self.label);
                    return Some(ws);
                }
                Err(e) => {
                    let wait = if delay.is_zero() {
                        delay
                    } else {
                        rand::thread_rng().gen_range(delay / 2..=delay)
                    };
                    warn!("{} redial attempt {attempt} failed: {e}; retrying in {wait:?}", self.label);
                    tokio::select! {
                        _ = self.cancel.cancelled() => return None,
                        _ = sleep(wait) => {}
                    }
                    delay = (delay * 2).min(max).max(min);
                }
            }
        }
    }

    /// After a redial: log in again on the authenticated session, then
    /// replay the last operation exactly once. `link` is held from the drain
    /// until the replay is queued, except while waiting for authorization.
    async fn resume(
        &self,
        mut link: MutexGuard<'_, Option<mpsc::Sender<String>>>,
        replay: Option<ActiveOp>,
        outbound: &mpsc::Sender<String>,
    ) {
        if let Some(auth) = &self.auth {
            match auth.login_request() {
                Ok(Some(req)) => match req.to_text() {
                    Ok(text) => {
                        if outbound.send(text).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!("{} failed to serialize login: {e}", self.label),
                },
                Ok(None) => {}
                Err(e) => warn!("{} failed to sign login: {e}", self.label),
            }
            let Some(pending) = replay.as_ref() else {
                return;
            };
            if pending.req.op == Operation::Login {
                // the fresh login above replaces the stale signed one
                return;
            }

            drop(link);
            let poll = self.config.auth_poll_interval();
            let limit = self.config.auth_timeout();
            if let Err(e) = wait_authorized(auth, poll, limit, &self.cancel).await {
                warn!("{} replaying without authorization: {e}", self.label);
            }
            link = self.link.lock().await;

            let latest = self.active.lock().as_ref().map(|a| a.seq);
            if latest != Some(pending.seq) {
                debug!("{} newer operation already sent, skipping replay", self.label);
                return;
            }
        }

        if let Some(active) = replay {
            debug!("{} replaying last {} operation", self.label, active.req.op);
            self.track(&active.req);
            if outbound.send(active.text).await.is_err() {
                warn!("{} outbound queue closed before replay", self.label);
            }
        }
        drop(link);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("label", &self.label)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    #[tokio::test(start_paused = true)]
    async fn test_wait_authorized_times_out() {
        let auth = Authenticator::new(
            &Credentials::new("key", "secret", "phrase"),
            Duration::from_secs(30),
        );
        let cancel = CancellationToken::new();
        let res = wait_authorized(
            &auth,
            Duration::from_millis(300),
            Duration::from_secs(2),
            &cancel,
        )
        .await;
        assert!(matches!(res, Err(GatewayError::AuthTimeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_authorized_sees_flag() {
        let auth = Arc::new(Authenticator::new(
            &Credentials::new("key", "secret", "phrase"),
            Duration::from_secs(30),
        ));
        let cancel = CancellationToken::new();
        let flag = auth.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(1)).await;
            flag.state().mark_authorized();
        });
        let res = wait_authorized(
            &auth,
            Duration::from_millis(300),
            Duration::from_secs(30),
            &cancel,
        )
        .await;
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn test_wait_authorized_cancelled() {
        let auth = Authenticator::new(
            &Credentials::new("key", "secret", "phrase"),
            Duration::from_secs(30),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let res = wait_authorized(&auth, Duration::from_millis(300), Duration::from_secs(30), &cancel).await;
        assert!(matches!(res, Err(GatewayError::Cancelled)));
    }
}
