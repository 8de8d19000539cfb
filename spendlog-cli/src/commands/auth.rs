//! Auth commands - register, login, logout, whoami

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::Password;
use spendlog_core::{AuthResult, RegisterRequest};

use super::{gate, get_context, print_json, surface, write_session, Globals};
use crate::output;

pub async fn register(
    globals: &Globals,
    name: String,
    email: String,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?,
    };

    let ctx = get_context(globals)?;
    let result = surface(
        ctx.auth_service
            .register(RegisterRequest::new(name, email, password))
            .await,
    )?;
    write_session(&globals.session_path(), &result.token)?;

    print_session(&result, "Account created", json)
}

pub async fn login(
    globals: &Globals,
    email: String,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => Password::new().with_prompt("Password").interact()?,
    };

    let ctx = get_context(globals)?;
    let result = surface(ctx.auth_service.login(&email, &password).await)?;
    write_session(&globals.session_path(), &result.token)?;

    print_session(&result, "Logged in", json)
}

/// Tokens cannot be revoked, so this only forgets the local copy
pub fn logout(globals: &Globals) -> Result<()> {
    let path = globals.session_path();
    match std::fs::remove_file(&path) {
        Ok(()) => output::success("Logged out"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("{}", "Not logged in".dimmed())
        }
        Err(e) => return Err(e).context("Failed to remove session file"),
    }
    Ok(())
}

pub async fn whoami(globals: &Globals, json: bool) -> Result<()> {
    let ctx = get_context(globals)?;
    let user = gate(&ctx, globals).await?;

    if json {
        return print_json(&user.to_public());
    }

    println!("{} <{}>", user.name.bold(), user.email);
    println!("  {}", format!("ID: {}", user.id).dimmed());
    println!(
        "  {}",
        format!("Member since {}", user.created_at.format("%Y-%m-%d")).dimmed()
    );
    Ok(())
}

fn print_session(result: &AuthResult, headline: &str, json: bool) -> Result<()> {
    if json {
        return print_json(result);
    }
    output::success(&format!("{} as {}", headline, result.user.email));
    println!("  {}", "Session saved, valid for 24 hours".dimmed());
    Ok(())
}
