//! Register command - create a new user with a PIN

use anyhow::Result;
use dialoguer::Password;

use super::get_context;
use crate::output;

pub fn run(name: &str) -> Result<()> {
    let ctx = get_context()?;

    let pin = if let Ok(pin) = std::env::var("PB_PIN") {
        pin
    } else {
        let p1 = Password::new().with_prompt("Choose a 4-digit PIN").interact()?;
        let p2 = Password::new().with_prompt("Confirm PIN").interact()?;
        if p1 != p2 {
            anyhow::bail!("PINs do not match");
        }
        p1
    };

    ctx.auth_service.register(name, &pin)?;
    output::success(&format!("Registered '{}'", name.trim()));

    Ok(())
}
