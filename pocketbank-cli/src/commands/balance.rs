//! Balance command - show the current balance

use anyhow::Result;
use chrono::Utc;

use pocketbank_core::domain::money::format_money;

use super::{authenticate, get_context};

pub fn run(name: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user = authenticate(&ctx, name)?;

    let balance = ctx.transaction_service.balance(&user, Utc::now())?;
    ctx.session.logout();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "user": user.to_string(),
                "balance": format_money(balance),
                "currency": ctx.config.currency,
            })
        );
        return Ok(());
    }

    println!("{} {}", format_money(balance), ctx.config.currency);
    Ok(())
}
