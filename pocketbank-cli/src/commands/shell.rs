//! Shell command - interactive menu-driven session
//!
//! Keeps one session open across multiple operations. The session locks
//! itself after the configured idle period; a locked session asks for the
//! PIN again before continuing.

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use dialoguer::{Confirm, Input, Select};

use pocketbank_core::domain::money::format_money;
use pocketbank_core::{BankContext, Error, HistoryFilter, UserKey};

use super::{authenticate, get_context, get_pin_or_prompt, parse_amount};
use crate::output;

const MENU: &[&str] = &["Balance", "Deposit", "Withdraw", "Statement", "Logout"];

pub fn run(name: &str) -> Result<()> {
    let ctx = get_context()?;
    let user = authenticate(&ctx, name)?;
    output::info(&format!("Welcome, {}", name.trim()));

    loop {
        // The idle clock keeps running while the menu waits for input
        ctx.session.tick(Utc::now());
        if ctx.session.state().is_locked() {
            output::warning("Session locked after inactivity");
            if !unlock(&ctx, name)? {
                break;
            }
        }

        let choice = Select::new()
            .with_prompt("What would you like to do?")
            .items(MENU)
            .default(0)
            .interact()?;

        let outcome = match choice {
            0 => show_balance(&ctx, &user),
            1 => transact(&ctx, &user, true),
            2 => transact(&ctx, &user, false),
            3 => show_statement(&ctx, &user),
            _ => break,
        };

        match outcome {
            Ok(()) => {}
            Err(Error::NotAuthenticated) => {
                output::warning("Session locked after inactivity");
                if !unlock(&ctx, name)? {
                    break;
                }
            }
            Err(e) => output::error(&format!("{}", e)),
        }
    }

    ctx.session.logout();
    output::info("Goodbye");
    Ok(())
}

/// Re-verify the PIN for a locked session. Returns false if the user
/// gives up (or is locked out), which ends the shell.
fn unlock(ctx: &BankContext, name: &str) -> Result<bool> {
    loop {
        let pin = get_pin_or_prompt("PIN to unlock")?;
        match ctx.auth_service.verify(name, &pin, Utc::now()) {
            Ok(key) => {
                ctx.session.login(key, Utc::now());
                return Ok(true);
            }
            Err(Error::WrongPin) => {
                output::error("Wrong PIN");
                if !Confirm::new().with_prompt("Try again?").default(true).interact()? {
                    return Ok(false);
                }
            }
            Err(e) => {
                output::error(&format!("{}", e));
                return Ok(false);
            }
        }
    }
}

fn show_balance(ctx: &BankContext, user: &UserKey) -> pocketbank_core::Result<()> {
    let balance = ctx.transaction_service.balance(user, Utc::now())?;
    println!("{} {}", format_money(balance).bold(), ctx.config.currency);
    Ok(())
}

fn transact(ctx: &BankContext, user: &UserKey, is_deposit: bool) -> pocketbank_core::Result<()> {
    let raw: String = Input::new()
        .with_prompt("Amount")
        .interact_text()
        .map_err(|e| Error::storage(e.to_string()))?;
    let amount = match parse_amount(&raw) {
        Ok(amount) => amount,
        Err(e) => {
            output::error(&format!("{}", e));
            return Ok(());
        }
    };

    let category_idx = Select::new()
        .with_prompt("Category")
        .items(&ctx.config.categories)
        .default(0)
        .interact()
        .map_err(|e| Error::storage(e.to_string()))?;
    let category = ctx.config.categories[category_idx].clone();

    let note: String = Input::new()
        .with_prompt("Note")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| Error::storage(e.to_string()))?;

    if amount >= ctx.config.suspicious_limit {
        output::warning(&format!(
            "Amount {} is at or above the review threshold of {}",
            format_money(amount),
            format_money(ctx.config.suspicious_limit)
        ));
        let proceed = Confirm::new()
            .with_prompt("Proceed anyway?")
            .default(false)
            .interact()
            .map_err(|e| Error::storage(e.to_string()))?;
        if !proceed {
            println!("{}", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let result = if is_deposit {
        ctx.transaction_service.deposit(user, amount, &category, &note, Utc::now())?
    } else {
        ctx.transaction_service.withdraw(user, amount, &category, &note, Utc::now())?
    };

    output::success(&format!(
        "New balance: {} {}",
        format_money(result.new_balance),
        ctx.config.currency
    ));
    if result.suspicious {
        output::warning("This transaction was flagged for review");
    }
    Ok(())
}

fn show_statement(ctx: &BankContext, user: &UserKey) -> pocketbank_core::Result<()> {
    let entries = ctx
        .transaction_service
        .statement(user, &HistoryFilter::all(), Utc::now())?;

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
    Ok(())
}
