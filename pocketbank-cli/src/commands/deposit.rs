//! Deposit command

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use dialoguer::Confirm;

use pocketbank_core::domain::money::format_money;

use super::{authenticate, get_context, parse_amount};
use crate::output;

pub fn run(
    name: &str,
    amount: &str,
    category: Option<&str>,
    note: Option<&str>,
    yes: bool,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    let amount = parse_amount(amount)?;
    let user = authenticate(&ctx, name)?;

    // Large amounts get an extra confirmation before anything is written
    if amount >= ctx.config.suspicious_limit && !yes && !json {
        output::warning(&format!(
            "Amount {} is at or above the review threshold of {}",
            format_money(amount),
            format_money(ctx.config.suspicious_limit)
        ));
        if !Confirm::new()
            .with_prompt("Proceed anyway?")
            .default(false)
            .interact()?
        {
            println!("{}", "Cancelled".dimmed());
            ctx.session.logout();
            return Ok(());
        }
    }

    let result = ctx
        .transaction_service
        .deposit(&user, amount, category.unwrap_or(""), note.unwrap_or(""), Utc::now())?;
    ctx.session.logout();

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    output::success(&format!(
        "Deposited {}. New balance: {} {}",
        format_money(amount),
        format_money(result.new_balance),
        ctx.config.currency
    ));
    if result.suspicious {
        output::warning("This transaction was flagged for review");
    }

    Ok(())
}
