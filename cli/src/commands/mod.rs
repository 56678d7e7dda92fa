//! Subcommand handlers

mod admin;
mod otp;
mod prompt;

use std::sync::Arc;

use anyhow::Context as _;
use enroll_core::services::{Clock, SystemClock, VerificationPolicy};
use enroll_infra::{open_session_store, BackendClient, SessionBackend};
use enroll_shared::AppConfig;
use tracing::debug;

use crate::args::Command;

/// Everything a command needs, built once from the configuration
pub struct Context {
    pub api: Arc<BackendClient>,
    pub store: Arc<SessionBackend>,
    pub clock: Arc<dyn Clock>,
    pub policy: VerificationPolicy,
    pub json: bool,
}

impl Context {
    pub async fn build(config: &AppConfig, json: bool) -> anyhow::Result<Self> {
        let api = BackendClient::new(&config.backend).context("Failed to create backend client")?;
        let store = open_session_store(&config.storage)
            .await
            .context("Failed to open session store")?;
        debug!(store = ?store.kind(), "Session store ready");

        Ok(Self {
            api: Arc::new(api),
            store: Arc::new(store),
            clock: Arc::new(SystemClock),
            policy: VerificationPolicy::from(&config.verification),
            json,
        })
    }
}

pub async fn run(command: Command, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Command::Verify(args) => otp::verify(ctx, args).await,
        Command::Signin(args) => otp::sign_in(ctx, args).await,
        Command::ResetPassword(args) => otp::reset_password(ctx, args).await,
        Command::Status(args) => otp::status(ctx, args).await,
        Command::Abandon(args) => otp::abandon(ctx, args).await,
        Command::Accounts(args) => admin::accounts(ctx, args.command).await,
        Command::Announcements(args) => admin::announcements(ctx, args.command).await,
        Command::Roles(args) => admin::roles(ctx, args.command).await,
        Command::Queue(args) => admin::queue(ctx, args.command).await,
    }
}
