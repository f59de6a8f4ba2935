//! Session lifecycle commands.
//!
//! Passwords come from the flag, then `BOOKNEST_PASSWORD` (or
//! `BOOKNEST_CURRENT_PASSWORD` for the old one), then one line of stdin.

use std::error::Error;
use std::io::BufRead;

use clap::Subcommand;
use secrecy::SecretString;

use booknest_client::ClientState;

use crate::output;

#[derive(Subcommand)]
pub enum PasswordAction {
    /// Request a reset link
    Forgot { email: String },
    /// Set a new password with a reset token
    Reset {
        token: String,
        #[arg(short, long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
        #[arg(short, long, env = PASSWORD_ENV, hide_env_values = true)]
        confirm: Option<String>,
    },
    /// Change the signed-in user's password
    Change {
        #[arg(long, env = "BOOKNEST_CURRENT_PASSWORD", hide_env_values = true)]
        current: Option<String>,
        #[arg(short, long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
        #[arg(short, long, env = PASSWORD_ENV, hide_env_values = true)]
        confirm: Option<String>,
    },
}

pub const PASSWORD_ENV: &str = "BOOKNEST_PASSWORD";

/// The given secret, or one line read from stdin after `prompt`.
fn secret(value: Option<String>, prompt: &str) -> Result<SecretString, Box<dyn Error>> {
    if let Some(value) = value {
        return Ok(SecretString::from(value));
    }
    output::prompt(prompt);
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(format!("{prompt} not given").into());
    }
    Ok(SecretString::from(line.trim_end_matches(['\r', '\n']).to_string()))
}

pub async fn login(
    state: &ClientState,
    email: &str,
    password: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let password = secret(password, "Password")?;
    let session = state.auth().login(email, &password).await?;
    output::line(format_args!("Welcome back, {}!", session.first_name()));
    Ok(())
}

pub async fn register(
    state: &ClientState,
    name: &str,
    email: &str,
    password: Option<String>,
    confirm: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let password = secret(password, "Password")?;
    let confirm = secret(confirm, "Repeat password")?;
    let session = state
        .auth()
        .register(name, email, &password, &confirm)
        .await?;
    output::line(format_args!("Account created for {}", session.email));
    Ok(())
}

pub fn logout(state: &ClientState) -> Result<(), Box<dyn Error>> {
    state.auth().logout()?;
    output::line("Signed out");
    Ok(())
}

pub fn whoami(state: &ClientState) {
    let auth = state.auth();
    match auth.current() {
        Some(session) => {
            let admin = if auth.is_admin() { " (admin)" } else { "" };
            output::line(format_args!(
                "{} <{}> [{}]{admin}",
                session.name, session.email, session.id
            ));
        }
        None => output::line("Not signed in"),
    }
}

pub async fn password(state: &ClientState, action: PasswordAction) -> Result<(), Box<dyn Error>> {
    let auth = state.auth();
    match action {
        PasswordAction::Forgot { email } => {
            auth.forgot_password(&email).await?;
            output::line("If that account exists, a reset link is on its way");
        }
        PasswordAction::Reset {
            token,
            password,
            confirm,
        } => {
            let password = secret(password, "New password")?;
            let confirm = secret(confirm, "Repeat password")?;
            auth.reset_password(&token, &password, &confirm).await?;
            output::line("Password reset. You can sign in now.");
        }
        PasswordAction::Change {
            current,
            password,
            confirm,
        } => {
            let current = secret(current, "Current password")?;
            let password = secret(password, "New password")?;
            let confirm = secret(confirm, "Repeat password")?;
            auth.change_password(&current, &password, &confirm).await?;
            output::line("Password changed");
        }
    }
    Ok(())
}
