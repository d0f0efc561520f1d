//! Status command - show account and scan counts

use anyhow::Result;
use colored::Colorize;

use super::get_admin_context;
use crate::output;

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_admin_context()?;
    let status = ctx.status_service.get_status().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "OralVis Status".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Accounts", &status.total_accounts.to_string()]);
    table.add_row(vec!["  Technicians", &status.technicians.to_string()]);
    table.add_row(vec!["  Dentists", &status.dentists.to_string()]);
    table.add_row(vec!["Scans", &status.total_scans.to_string()]);
    println!("{}", table);

    if let Some(latest) = &status.latest_upload {
        println!();
        println!("Latest upload: {}", output::format_timestamp(latest));
    }

    Ok(())
}
