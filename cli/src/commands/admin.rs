//! Administrative commands

use anyhow::Context as _;
use enroll_core::domain::{NewAccount, NewAnnouncement, QueueHistoryQuery, SystemLogEntry};
use enroll_core::errors::ApiError;
use enroll_shared::types::Pagination;
use tracing::warn;

use super::Context;
use crate::args::{AccountsCommand, AnnouncementsCommand, HistoryArgs, QueueCommand, RolesCommand};
use crate::render;

fn api_error(err: ApiError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

/// Audit trail entry for a mutation; failures are logged only
async fn audit(ctx: &Context, action: &str, details: String) {
    let actor = std::env::var("USER").unwrap_or_else(|_| "enroll-cli".to_string());
    let entry = SystemLogEntry::new(action, actor).with_details(details);
    if let Err(e) = ctx.api.record_system_log(&entry).await {
        warn!(action = action, error = %e, "Failed to record system log entry");
    }
}

pub async fn accounts(ctx: &Context, command: AccountsCommand) -> anyhow::Result<()> {
    match command {
        AccountsCommand::List(page) => {
            let accounts = ctx
                .api
                .list_accounts(Pagination::new(page.page, page.per_page))
                .await
                .map_err(api_error)?;
            if ctx.json {
                println!("{}", render::json(&accounts)?);
                return Ok(());
            }
            for account in &accounts.data {
                println!("{}", render::account_row(account));
            }
            println!(
                "page {} of {} ({} accounts)",
                accounts.page,
                accounts.total_pages().max(1),
                accounts.total
            );
        }
        AccountsCommand::Create {
            email,
            first_name,
            last_name,
            role,
            password,
        } => {
            let account = NewAccount {
                email,
                first_name,
                last_name,
                role,
                password,
            };
            let created = ctx.api.create_account(&account).await.map_err(api_error)?;
            audit(ctx, "account.created", format!("id={} role={}", created.id, created.role)).await;
            if ctx.json {
                println!("{}", render::json(&created)?);
            } else {
                println!("{}", render::account_row(&created));
            }
        }
        AccountsCommand::Delete { id } => {
            ctx.api.delete_account(id).await.map_err(api_error)?;
            audit(ctx, "account.deleted", format!("id={}", id)).await;
            println!("Deleted account {}.", id);
        }
    }
    Ok(())
}

pub async fn announcements(ctx: &Context, command: AnnouncementsCommand) -> anyhow::Result<()> {
    match command {
        AnnouncementsCommand::List => {
            let announcements = ctx.api.list_announcements().await.map_err(api_error)?;
            if ctx.json {
                println!("{}", render::json(&announcements)?);
                return Ok(());
            }
            for announcement in &announcements {
                println!("{}", render::announcement_row(announcement));
            }
        }
        AnnouncementsCommand::Publish { title, body, draft } => {
            let announcement = NewAnnouncement {
                title,
                body,
                is_published: !draft,
            };
            let created = ctx
                .api
                .publish_announcement(&announcement)
                .await
                .map_err(api_error)?;
            audit(ctx, "announcement.created", format!("id={}", created.id)).await;
            if ctx.json {
                println!("{}", render::json(&created)?);
            } else {
                println!("{}", render::announcement_row(&created));
            }
        }
        AnnouncementsCommand::Delete { id } => {
            ctx.api.delete_announcement(id).await.map_err(api_error)?;
            audit(ctx, "announcement.deleted", format!("id={}", id)).await;
            println!("Deleted announcement {}.", id);
        }
    }
    Ok(())
}

pub async fn roles(ctx: &Context, command: RolesCommand) -> anyhow::Result<()> {
    match command {
        RolesCommand::List => {
            let roles = ctx.api.access_control().await.map_err(api_error)?;
            if ctx.json {
                println!("{}", render::json(&roles)?);
                return Ok(());
            }
            for role in &roles {
                println!("{}", render::role_row(role));
            }
        }
    }
    Ok(())
}

pub async fn queue(ctx: &Context, command: QueueCommand) -> anyhow::Result<()> {
    match command {
        QueueCommand::History(args) => history(ctx, args).await,
    }
}

async fn history(ctx: &Context, args: HistoryArgs) -> anyhow::Result<()> {
    let query = QueueHistoryQuery {
        from: args.from,
        to: args.to,
        service: args.service,
        status: args.status,
        page: args.page,
        per_page: args.per_page,
    };
    query.validate().map_err(anyhow::Error::msg)?;

    if let Some(path) = args.export {
        let csv = ctx
            .api
            .export_queue_history(&query)
            .await
            .map_err(api_error)?;
        tokio::fs::write(&path, &csv)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {} bytes to {}.", csv.len(), path.display());
        return Ok(());
    }

    let history = ctx.api.queue_history(&query).await.map_err(api_error)?;
    if ctx.json {
        println!("{}", render::json(&history)?);
        return Ok(());
    }
    for record in &history.data {
        println!("{}", render::queue_row(record));
    }
    println!(
        "page {} of {} ({} tickets)",
        history.page,
        history.total_pages().max(1),
        history.total
    );
    Ok(())
}
