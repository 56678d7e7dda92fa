//! Command line arguments

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use enroll_core::domain::{OtpPurpose, QueueStatus, Role};

#[derive(Parser, Debug)]
#[command(
    name = "enroll",
    version,
    about = "Enrollment client: email OTP verification and administration"
)]
pub struct Cli {
    /// TOML configuration file (defaults to enroll.<environment>.toml when present)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, overrides the configuration
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verify a newly registered email address
    Verify(VerifyArgs),
    /// Sign in with a password and the emailed second-factor code
    Signin(SigninArgs),
    /// Request and verify a password reset code
    ResetPassword(EmailArgs),
    /// Show backend and local verification status for an address
    Status(StatusArgs),
    /// Forget the locally persisted session for an address
    Abandon(EmailArgs),
    /// Manage staff and applicant accounts
    Accounts(AccountsArgs),
    /// Manage announcements
    Announcements(AnnouncementsArgs),
    /// Inspect role permissions
    Roles(RolesArgs),
    /// Service queue history
    Queue(QueueArgs),
}

#[derive(Args, Debug)]
pub struct EmailArgs {
    #[arg(long, short = 'e')]
    pub email: String,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[arg(long, short = 'e')]
    pub email: String,

    /// Request a fresh code before prompting
    #[arg(long)]
    pub send: bool,
}

#[derive(Args, Debug)]
pub struct SigninArgs {
    #[arg(long, short = 'e')]
    pub email: String,

    #[arg(long, short = 'p', env = "ENROLL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[arg(long, short = 'e')]
    pub email: String,

    /// email-verification, sign-in or password-reset
    #[arg(long, default_value = "email-verification")]
    pub purpose: OtpPurpose,
}

#[derive(Args, Debug)]
pub struct AccountsArgs {
    #[command(subcommand)]
    pub command: AccountsCommand,
}

#[derive(Subcommand, Debug)]
pub enum AccountsCommand {
    List(PageArgs),
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long, default_value = "staff")]
        role: Role,
        #[arg(long, env = "ENROLL_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[arg(long, default_value_t = 20)]
    pub per_page: u32,
}

#[derive(Args, Debug)]
pub struct AnnouncementsArgs {
    #[command(subcommand)]
    pub command: AnnouncementsCommand,
}

#[derive(Subcommand, Debug)]
pub enum AnnouncementsCommand {
    List,
    Publish {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        /// Save without publishing
        #[arg(long)]
        draft: bool,
    },
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Args, Debug)]
pub struct RolesArgs {
    #[command(subcommand)]
    pub command: RolesCommand,
}

#[derive(Subcommand, Debug)]
pub enum RolesCommand {
    List,
}

#[derive(Args, Debug)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommand,
}

#[derive(Subcommand, Debug)]
pub enum QueueCommand {
    History(HistoryArgs),
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// First day, YYYY-MM-DD
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day, YYYY-MM-DD
    #[arg(long)]
    pub to: Option<NaiveDate>,

    #[arg(long)]
    pub status: Option<QueueStatus>,

    #[arg(long)]
    pub service: Option<String>,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long)]
    pub per_page: Option<u32>,

    /// Write the CSV export to FILE instead of listing
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,
}
