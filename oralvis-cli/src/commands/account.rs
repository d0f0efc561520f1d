//! Account command - provision and inspect logins

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::{Confirm, Password};
use oralvis_core::Role;

use super::get_admin_context;
use crate::output;

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create an account
    Add {
        /// Login identity (email address)
        identity: String,
        /// Technician or Dentist
        #[arg(long)]
        role: String,
        /// Secret; prompted for with hidden input when omitted
        #[arg(long)]
        secret: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List accounts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove all accounts and re-create the configured seed accounts
    Reset {
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },
}

pub async fn run(command: AccountCommands) -> Result<()> {
    match command {
        AccountCommands::Add {
            identity,
            role,
            secret,
            json,
        } => add(&identity, &role, secret, json).await,
        AccountCommands::List { json } => list(json).await,
        AccountCommands::Reset { force } => reset(force).await,
    }
}

async fn add(identity: &str, role: &str, secret: Option<String>, json: bool) -> Result<()> {
    let role: Role = role.parse()?;
    let secret = match secret {
        Some(s) => s,
        None => Password::new()
            .with_prompt("Secret")
            .with_confirmation("Repeat secret", "Secrets do not match")
            .interact()?,
    };

    let ctx = get_admin_context()?;
    let summary = ctx.account_service.create_account(identity, &secret, role).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        output::success(&format!("Created {} account {}", summary.role, summary.identity));
    }
    Ok(())
}

async fn list(json: bool) -> Result<()> {
    let ctx = get_admin_context()?;
    let accounts = ctx.account_service.list_accounts().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&accounts)?);
        return Ok(());
    }

    if accounts.is_empty() {
        println!("{}", "No accounts".dimmed());
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Identity", "Role", "Created"]);
    for account in &accounts {
        table.add_row(vec![
            account.identity.clone(),
            account.role.to_string(),
            output::format_timestamp(&account.created_at),
        ]);
    }
    println!("{}", table);
    Ok(())
}

async fn reset(force: bool) -> Result<()> {
    let ctx = get_admin_context()?;

    if !force {
        output::warning("This removes every account and re-creates the seed accounts.");
        println!("{}\n", "Scans are not affected.".dimmed());

        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            println!("{}", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let created = ctx.account_service.reset(&ctx.config.seed_accounts).await?;
    output::success(&format!("Accounts reset; {} seed account(s) created", created));
    Ok(())
}
