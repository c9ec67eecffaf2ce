//! Client façade wiring sessions, login, sinks and the two namespaces

use crate::auth::{AuthStatus, Authenticator};
use crate::config::ClientConfig;
use crate::dispatch::Router;
use crate::error::GatewayError;
use crate::private::{Private, PrivateSinks};
use crate::public::{Public, PublicSinks};
use crate::session::{Session, wait_authorized};
use crate::sink::{ControlSinks, DeliveryStats};
use crate::topic::OperationSender;
use async_trait::async_trait;
use log::debug;
use okws_core::{
    Arg, ErrorEvent, LoginEvent, Operation, SubscribeEvent, SuccessEvent, UnsubscribeEvent,
    WsRequest,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Owns both sessions and the login state; the namespaces reach it only
/// through [`OperationSender`]
#[derive(Debug)]
pub struct Connector {
    config: Arc<ClientConfig>,
    private: Arc<Session>,
    public: Arc<Session>,
    auth: Option<Arc<Authenticator>>,
    cancel: CancellationToken,
}

impl Connector {
    fn session(&self, needs_auth: bool) -> &Arc<Session> {
        if needs_auth { &self.private } else { &self.public }
    }

    /// Send a login on the authenticated session.
    ///
    /// No-op when already authorized or when a login went out within the
    /// throttle window.
    pub async fn login(&self) -> Result<(), GatewayError> {
        let auth = self.auth.as_ref().ok_or(GatewayError::MissingCredentials)?;
        match auth.login_request()? {
            Some(req) => self.private.submit(req).await,
            None => {
                debug!("Login skipped ({:?})", auth.state().status());
                Ok(())
            }
        }
    }

    pub async fn wait_for_authorization(&self) -> Result<(), GatewayError> {
        let auth = self.auth.as_ref().ok_or(GatewayError::MissingCredentials)?;
        wait_authorized(
            auth,
            self.config.auth_poll_interval(),
            self.config.auth_timeout(),
            &self.cancel,
        )
        .await
    }

    pub fn is_authorized(&self) -> bool {
        self.auth.as_ref().is_some_and(|a| a.state().is_authorized())
    }
}

#[async_trait]
impl OperationSender for Connector {
    /// Restricted subscriptions log in and wait for authorization first
    async fn send_operation(&self, needs_auth: bool, req: WsRequest) -> Result<(), GatewayError> {
        if needs_auth && req.op != Operation::Login {
            self.login().await?;
            self.wait_for_authorization().await?;
        }
        self.session(needs_auth).submit(req).await
    }
}

/// Push-stream client
///
/// Cheap to clone; every clone drives the same two sessions.
#[derive(Clone)]
pub struct WsClient {
    connector: Arc<Connector>,
    control: Arc<ControlSinks>,
    stats: Arc<DeliveryStats>,
    private: Private,
    public: Public,
}

impl WsClient {
    /// Build a client with its own cancellation token
    pub fn new(config: ClientConfig) -> Result<Self, GatewayError> {
        Self::with_cancellation(config, CancellationToken::new())
    }

    /// Build a client stopped by `cancel` (shared process-wide shutdown)
    pub fn with_cancellation(
        config: ClientConfig,
        cancel: CancellationToken,
    ) -> Result<Self, GatewayError> {
        config.validate()?;
        // wss endpoints need a process-wide provider; another one may already be installed
        let _ = rustls::crypto::ring::default_provider().install_default();
        let config = Arc::new(config);

        let auth = config
            .credentials
            .as_ref()
            .map(|c| Arc::new(Authenticator::new(c, config.login_throttle())));
        let control = Arc::new(ControlSinks::default());
        let private_sinks = Arc::new(PrivateSinks::default());
        let public_sinks = Arc::new(PublicSinks::default());
        let stats = Arc::new(DeliveryStats::default());
        let router = Arc::new(Router::new(
            control.clone(),
            private_sinks.clone(),
            public_sinks.clone(),
            auth.clone(),
            stats.clone(),
        ));

        let connector = Arc::new(Connector {
            private: Arc::new(Session::new(
                true,
                config.clone(),
                router.clone(),
                auth.clone(),
                cancel.clone(),
            )),
            public: Arc::new(Session::new(
                false,
                config.clone(),
                router,
                None,
                cancel.clone(),
            )),
            config,
            auth,
            cancel,
        });
        let sender: Arc<dyn OperationSender> = connector.clone();

        Ok(Self {
            private: Private::new(sender.clone(), private_sinks),
            public: Public::new(sender, public_sinks),
            connector,
            control,
            stats,
        })
    }

    /// Restricted namespace
    pub fn private(&self) -> &Private {
        &self.private
    }

    /// Open namespace
    pub fn public(&self) -> &Public {
        &self.public
    }

    pub async fn login(&self) -> Result<(), GatewayError> {
        self.connector.login().await
    }

    /// Poll until the authenticated session is authorized, up to the
    /// configured timeout
    pub async fn wait_for_authorization(&self) -> Result<(), GatewayError> {
        self.connector.wait_for_authorization().await
    }

    pub fn is_authorized(&self) -> bool {
        self.connector.is_authorized()
    }

    pub fn auth_status(&self) -> Option<AuthStatus> {
        self.connector.auth.as_ref().map(|a| a.state().status())
    }

    /// Subscribe with raw argument mappings; sinks are registered through
    /// the typed namespace methods
    pub async fn subscribe(&self, needs_auth: bool, args: Vec<Arg>) -> Result<(), GatewayError> {
        self.connector
            .send_operation(needs_auth, WsRequest::subscribe(args))
            .await
    }

    pub async fn unsubscribe(&self, needs_auth: bool, args: Vec<Arg>) -> Result<(), GatewayError> {
        self.connector
            .send_operation(needs_auth, WsRequest::unsubscribe(args))
            .await
    }

    /// Topic arguments believed subscribed on one session
    pub fn subscriptions(&self, needs_auth: bool) -> Vec<Arg> {
        self.connector.session(needs_auth).subscriptions()
    }

    pub fn set_error_sink(&self, sink: mpsc::Sender<ErrorEvent>) {
        self.control.error.set(sink);
    }

    pub fn set_subscribe_sink(&self, sink: mpsc::Sender<SubscribeEvent>) {
        self.control.subscribe.set(sink);
    }

    pub fn set_unsubscribe_sink(&self, sink: mpsc::Sender<UnsubscribeEvent>) {
        self.control.unsubscribe.set(sink);
    }

    pub fn set_login_sink(&self, sink: mpsc::Sender<LoginEvent>) {
        self.control.login.set(sink);
    }

    pub fn set_success_sink(&self, sink: mpsc::Sender<SuccessEvent>) {
        self.control.success.set(sink);
    }

    pub fn stats(&self) -> &DeliveryStats {
        &self.stats
    }

    /// Frames dropped because a sink was full
    pub fn dropped_deliveries(&self) -> u64 {
        self.stats.dropped()
    }

    /// Stop every background task and halt redialing for good
    pub fn shutdown(&self) {
        self.connector.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.connector.cancel.is_cancelled()
    }
}
