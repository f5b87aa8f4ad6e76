use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use teloxide::types::Update;
use url::Url;

use crate::client::{BotClient, ClientError};
use crate::commands::{CommandRouter, Dispatch};
use crate::config::Config;
use crate::error::{AppError, InitError};

/// The bot's runtime: the Telegram session plus the command router.
/// Built once per process and shared read-only by every request.
pub struct Application {
    client: Arc<dyn BotClient>,
    router: CommandRouter,
    request_timeout: Duration,
    active_sessions: AtomicUsize,
}

impl Application {
    pub fn new(
        client: Arc<dyn BotClient>,
        router: CommandRouter,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            router,
            request_timeout,
            active_sessions: AtomicUsize::new(0),
        }
    }

    /// Opens a per-call session. The client is only reachable through it,
    /// and it is released when dropped on every exit path.
    pub fn session(&self) -> Session<'_> {
        let active = self.active_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Session opened ({active} active)");

        Session { app: self }
    }

    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::SeqCst)
    }
}

pub struct Session<'a> {
    app: &'a Application,
}

impl Session<'_> {
    pub async fn dispatch(&self, update: &Update) -> Result<Dispatch, ClientError> {
        self.bounded(self.app.router.dispatch(self.app.client.as_ref(), update))
            .await
    }

    pub async fn register_webhook(&self, url: &Url) -> Result<bool, ClientError> {
        self.bounded(self.app.client.register_webhook(url)).await
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let limit = self.app.request_timeout;

        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| ClientError::Timeout(limit))?
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        let active = self.app.active_sessions.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!("Session closed ({active} active)");
    }
}

/// Owns the single Application for the process, or the reason it could
/// not be built. Routes check it before touching Telegram.
pub struct Lifecycle {
    application: Result<Application, InitError>,
}

impl Lifecycle {
    /// Builds the Application exactly once. `connect` turns the token into a
    /// Bot API client and is not called when the token is missing.
    pub fn initialize<F, C>(config: &Config, connect: F) -> Self
    where
        F: FnOnce(&str) -> Result<C, InitError>,
        C: BotClient + 'static,
    {
        let application = config
            .telegram_token
            .as_deref()
            .ok_or(InitError::MissingToken)
            .and_then(connect)
            .map(|client| {
                Application::new(
                    Arc::new(client),
                    CommandRouter::new(config.bot_username.clone()),
                    config.request_timeout,
                )
            });

        match &application {
            Ok(_) => info!("Bot application initialized"),
            Err(err) => error!("Bot application failed to initialize: {err}"),
        }

        Self { application }
    }

    pub fn application(&self) -> Result<&Application, AppError> {
        self.application
            .as_ref()
            .map_err(|err| AppError::NotInitialized(err.clone()))
    }
}
