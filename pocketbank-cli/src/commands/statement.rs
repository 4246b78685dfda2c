//! Statement command - filtered transaction history

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;

use pocketbank_core::domain::money::format_money;
use pocketbank_core::{HistoryFilter, KindFilter};

use super::{authenticate, get_context};
use crate::output;

fn parse_kind(kind: &str) -> Result<KindFilter> {
    match kind.to_lowercase().as_str() {
        "all" => Ok(KindFilter::All),
        "deposit" | "deposits" => Ok(KindFilter::Deposit),
        "withdrawal" | "withdrawals" => Ok(KindFilter::Withdrawal),
        other => anyhow::bail!("unknown kind '{}' (expected all, deposit or withdrawal)", other),
    }
}

pub fn run(name: &str, kind: &str, category: Option<&str>, json: bool) -> Result<()> {
    let filter = HistoryFilter {
        kind: parse_kind(kind)?,
        category: category.map(|c| c.to_string()),
    };

    let ctx = get_context()?;
    let user = authenticate(&ctx, name)?;

    let entries = ctx.transaction_service.statement(&user, &filter, Utc::now())?;
    ctx.session.logout();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", "No transactions".dimmed());
        return Ok(());
    }

    let mut table = output::statement_table();
    for entry in &entries {
        table.add_row(vec![
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.kind.to_string(),
            format_money(entry.amount),
            format_money(entry.resulting_balance),
            entry.category.clone(),
            entry.note.clone(),
        ]);
    }
    println!("{}", table);
    println!();
    println!("{} transactions", entries.len());

    Ok(())
}
