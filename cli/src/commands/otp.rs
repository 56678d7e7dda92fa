//! Enrollee OTP commands

use std::sync::Arc;

use anyhow::Context as _;
use enroll_core::domain::{OtpPurpose, VerificationSession};
use enroll_core::errors::FlowError;
use enroll_core::services::{
    Clock, EnrolleeApi, OtpTimer, SessionStore, SignIn, TimerState, VerificationFlow, VerifiedOtp,
};
use enroll_infra::{BackendClient, SessionBackend};
use enroll_shared::utils::{is_valid_email, normalize_email};
use serde_json::json;
use tracing::info;

use super::prompt::interact;
use super::Context;
use crate::args::{EmailArgs, SigninArgs, StatusArgs, VerifyArgs};
use crate::render;

pub type Flow = VerificationFlow<BackendClient, SessionBackend>;

async fn open(ctx: &Context, email: &str, purpose: OtpPurpose) -> Result<Flow, FlowError> {
    VerificationFlow::open(
        Arc::clone(&ctx.api),
        Arc::clone(&ctx.store),
        Arc::clone(&ctx.clock),
        ctx.policy,
        email,
        purpose,
    )
    .await
}

fn user_error(err: FlowError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

pub async fn verify(ctx: &Context, args: VerifyArgs) -> anyhow::Result<()> {
    let mut flow = match open(ctx, &args.email, OtpPurpose::EmailVerification).await {
        Ok(flow) => flow,
        Err(FlowError::AlreadyVerified) => {
            println!("{} is already verified.", normalize_email(&args.email));
            return Ok(());
        }
        Err(e) => return Err(user_error(e)),
    };

    if args.send && flow.timer().state() != TimerState::LockedOut {
        flow.send().await.map_err(user_error)?;
    }

    match interact(flow).await? {
        Some(verified) => finish("Email verified.", &verified),
        None => Ok(()),
    }
}

pub async fn sign_in(ctx: &Context, args: SigninArgs) -> anyhow::Result<()> {
    let signed_in = VerificationFlow::sign_in(
        Arc::clone(&ctx.api),
        Arc::clone(&ctx.store),
        Arc::clone(&ctx.clock),
        ctx.policy,
        &args.email,
        &args.password,
    )
    .await
    .map_err(user_error)?;

    match signed_in {
        SignIn::Authenticated(outcome) => {
            let verified = VerifiedOtp {
                message: outcome.message,
                token: outcome.token,
            };
            finish("Signed in.", &verified)
        }
        SignIn::OtpRequired(flow) => {
            let greeting = flow.timer().session().first_name.clone();
            if !greeting.is_empty() {
                println!("Welcome back, {}.", greeting);
            }
            match interact(flow).await? {
                Some(verified) => finish("Signed in.", &verified),
                None => Ok(()),
            }
        }
    }
}

pub async fn reset_password(ctx: &Context, args: EmailArgs) -> anyhow::Result<()> {
    let mut flow = open(ctx, &args.email, OtpPurpose::PasswordReset)
        .await
        .map_err(user_error)?;

    if flow.timer().state() != TimerState::LockedOut {
        flow.send().await.map_err(user_error)?;
    }

    match interact(flow).await? {
        Some(verified) => finish("Reset code accepted.", &verified),
        None => Ok(()),
    }
}

pub async fn status(ctx: &Context, args: StatusArgs) -> anyhow::Result<()> {
    let email = checked_email(&args.email)?;

    let remote = ctx
        .api
        .otp_status(args.purpose, &email)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let now = ctx.clock.now();
    let local = ctx
        .store
        .load(&VerificationSession::storage_key(&email))
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to read local session")?
        .map(|session| OtpTimer::restore(session, now, ctx.policy).snapshot(now));

    if ctx.json {
        let body = json!({ "email": email, "purpose": args.purpose, "backend": remote, "local": local });
        println!("{}", render::json(&body)?);
        return Ok(());
    }

    println!("{} ({})", email, args.purpose);
    println!("{}", render::otp_status(&remote));
    match local {
        Some(snapshot) => println!("local session:  {}", render::countdown_line(&snapshot)),
        None => println!("local session:  none"),
    }
    Ok(())
}

pub async fn abandon(ctx: &Context, args: EmailArgs) -> anyhow::Result<()> {
    let email = checked_email(&args.email)?;
    ctx.store
        .delete(&VerificationSession::storage_key(&email))
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to delete local session")?;

    info!(event = "flow_abandoned", "Local verification session removed");
    println!("Forgot the local session for {}.", email);
    Ok(())
}

fn checked_email(raw: &str) -> anyhow::Result<String> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        return Err(user_error(FlowError::InvalidEmail { email }));
    }
    Ok(email)
}

fn finish(headline: &str, verified: &VerifiedOtp) -> anyhow::Result<()> {
    println!("{}", headline);
    if !verified.message.is_empty() {
        println!("{}", verified.message);
    }
    if let Some(token) = &verified.token {
        println!("token: {}", token);
    }
    Ok(())
}
