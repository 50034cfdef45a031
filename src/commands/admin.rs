use super::Session;
use crate::{
    db::management::Management,
    libs::{
        credentials::meets_policy,
        error::ValidationError,
        messages::Message,
        response::Responder,
        secret::{hash_password, verify_password},
        validate,
    },
    msg_bail_anyhow,
};
use anyhow::Result;
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Password};

#[derive(Debug, Args)]
pub struct AdminArgs {
    #[command(subcommand)]
    command: AdminCommand,
}

#[derive(Debug, Subcommand)]
enum AdminCommand {
    /// Create a management account
    Create {
        username: String,
        /// Prompted for (with confirmation) when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Check a management login
    Login {
        username: String,
        #[arg(short, long)]
        password: Option<String>,
    },
}

fn prompt_password(confirm: bool) -> Result<String> {
    let theme = ColorfulTheme::default();
    let mut prompt = Password::with_theme(&theme).with_prompt(Message::PromptPassword.to_string());
    if confirm {
        prompt = prompt.with_confirmation(Message::PromptPasswordConfirm.to_string(), Message::PasswordMismatch.to_string());
    }
    Ok(prompt.interact()?)
}

pub fn cmd(args: AdminArgs, out: &Responder) -> Result<()> {
    let session = Session::open()?;
    let accounts = Management::new(&session.db.conn);

    match args.command {
        AdminCommand::Create { username, password } => {
            let username = validate::required("username", Some(username.as_str()))?.to_lowercase();
            validate::identifier("username", &username)?;
            let password = match password {
                Some(p) => p,
                None => prompt_password(true)?,
            };
            if !meets_policy(&password, &session.config.password) {
                return Err(ValidationError::out_of_range("password", Message::PasswordTooWeak(session.config.password.effective_length()).to_string()).into());
            }

            let id = accounts.create(&username, &hash_password(&password)?)?;
            tracing::info!(id, username = %username, "management account created");
            out.done(Message::AdminCreated(username))
        }
        AdminCommand::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password(false)?,
            };
            let admin = match accounts.get_by_username(&username)? {
                Some(a) if a.is_active && verify_password(&password, &a.password_hash) => a,
                _ => {
                    tracing::info!(username = %username, "management login rejected");
                    msg_bail_anyhow!(Message::InvalidCredentials);
                }
            };
            accounts.touch_login(admin.id)?;
            out.data(Message::LoginSuccessful(admin.username.clone()), &admin, |_| {})
        }
    }
}
