//! Frame classification and routing to sinks

use crate::auth::{Authenticator, LoginOutcome};
use crate::private::PrivateSinks;
use crate::public::PublicSinks;
use crate::sink::{ControlSinks, Delivery, DeliveryStats};
use log::{debug, info, trace, warn};
use okws_core::{
    Channel, Envelope, ErrorEvent, LoginEvent, Namespace, SubscribeEvent, SuccessEvent,
    UnsubscribeEvent,
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// What an inbound envelope is, in routing priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Error,
    Subscribe,
    Unsubscribe,
    Login,
    Push(Channel),
    /// Correlated response with a non-zero code
    CommandError,
    /// Correlated response with a zero code
    Ack,
    Unroutable,
}

pub fn classify(env: &Envelope) -> FrameKind {
    match env.event.as_deref() {
        Some("error") => return FrameKind::Error,
        Some("subscribe") => return FrameKind::Subscribe,
        Some("unsubscribe") => return FrameKind::Unsubscribe,
        Some("login") => return FrameKind::Login,
        _ => {}
    }
    if env.is_push() {
        if let Some(channel) = env.arg.as_ref().and_then(|a| a.channel()) {
            return FrameKind::Push(channel);
        }
    }
    if env.id.is_some() {
        return if env.code != 0 {
            FrameKind::CommandError
        } else {
            FrameKind::Ack
        };
    }
    FrameKind::Unroutable
}

/// Routes classified frames to the registered sinks of one client
#[derive(Debug)]
pub struct Router {
    control: Arc<ControlSinks>,
    private: Arc<PrivateSinks>,
    public: Arc<PublicSinks>,
    auth: Option<Arc<Authenticator>>,
    stats: Arc<DeliveryStats>,
}

impl Router {
    pub fn new(
        control: Arc<ControlSinks>,
        private: Arc<PrivateSinks>,
        public: Arc<PublicSinks>,
        auth: Option<Arc<Authenticator>>,
        stats: Arc<DeliveryStats>,
    ) -> Self {
        Self {
            control,
            private,
            public,
            auth,
            stats,
        }
    }

    /// Route one envelope. `outbound` is the queue of the connection the
    /// frame arrived on; a stale login confirmation is answered there.
    pub fn route(&self, env: Envelope, outbound: &mpsc::Sender<String>) {
        match classify(&env) {
            FrameKind::Error => {
                warn!("Exchange error {}: {}", env.code, env.message());
                let delivery = self.control.error.deliver(ErrorEvent::from(env));
                self.record("error", delivery);
            }
            FrameKind::Subscribe => {
                debug!("Subscribed: {}", env.arg.as_ref().map(|a| a.to_string()).unwrap_or_default());
                let delivery = self.control.subscribe.deliver(SubscribeEvent::from(env));
                self.record("subscribe", delivery);
            }
            FrameKind::Unsubscribe => {
                debug!("Unsubscribed: {}", env.arg.as_ref().map(|a| a.to_string()).unwrap_or_default());
                let delivery = self.control.unsubscribe.deliver(UnsubscribeEvent::from(env));
                self.record("unsubscribe", delivery);
            }
            FrameKind::Login => self.on_login(env, outbound),
            FrameKind::Push(channel) => {
                let delivery = match channel.namespace() {
                    Namespace::Restricted => self.private.route(channel, env),
                    Namespace::Open => self.public.route(channel, env),
                };
                self.record(&channel.name(), delivery);
            }
            FrameKind::CommandError => {
                warn!(
                    "Command {} failed with code {}: {}",
                    env.id.as_deref().unwrap_or_default(),
                    env.code,
                    env.message()
                );
                let delivery = self.control.error.deliver(ErrorEvent::from(env));
                self.record("error", delivery);
            }
            FrameKind::Ack => {
                let delivery = self.control.success.deliver(SuccessEvent::from(env));
                self.record("success", delivery);
            }
            FrameKind::Unroutable => {
                if env.event.as_deref() == Some("notice") {
                    warn!("Exchange notice {}: {}", env.code, env.message());
                } else {
                    trace!("Dropping unroutable frame: {:?}", env);
                }
            }
        }
    }

    fn on_login(&self, env: Envelope, outbound: &mpsc::Sender<String>) {
        let Some(auth) = &self.auth else {
            debug!("Login event without configured credentials");
            let delivery = self.control.login.deliver(LoginEvent::from(env));
            self.record("login", delivery);
            return;
        };

        if env.code != 0 {
            warn!("Login rejected with code {}: {}", env.code, env.message());
            auth.state().reject_login();
            let delivery = self.control.login.deliver(LoginEvent::from(env));
            self.record("login", delivery);
            return;
        }

        match auth.state().confirm_login() {
            LoginOutcome::Authorized => {
                info!("Login confirmed");
                let delivery = self.control.login.deliver(LoginEvent::from(env));
                self.record("login", delivery);
            }
            LoginOutcome::Stale => {
                warn!("Discarding stale login confirmation, logging in again");
                self.relogin(auth, outbound);
            }
        }
    }

    fn relogin(&self, auth: &Authenticator, outbound: &mpsc::Sender<String>) {
        let text = match auth.login_request().map(|r| r.map(|r| r.to_text())) {
            Ok(Some(Ok(text))) => text,
            Ok(None) => return,
            Ok(Some(Err(e))) => {
                warn!("Failed to serialize login: {e}");
                auth.state().reset();
                return;
            }
            Err(e) => {
                warn!("Failed to sign login: {e}");
                auth.state().reset();
                return;
            }
        };
        if let Err(e) = outbound.try_send(text) {
            warn!("Could not queue fresh login: {e}");
            auth.state().reset();
        }
    }

    fn record(&self, topic: &str, delivery: Delivery) {
        match &delivery {
            Delivery::Delivered => trace!("Delivered {topic}"),
            Delivery::NoSink => trace!("No sink for {topic}"),
            Delivery::Full => warn!("Sink for {topic} is full, dropping frame"),
            Delivery::Closed => debug!("Sink for {topic} closed, unregistered"),
            Delivery::Undecodable(e) => warn!("Undecodable {topic} payload: {e}"),
        }
        self.stats.record(&delivery);
    }
}
