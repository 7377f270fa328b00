//! Local accounts and the login session.

use std::io::{self, Write};

use clap::Subcommand;
use sfdesk_auth::{LoginDomain, ProfileUpdate, UserCredentials};

use crate::config::AppConfig;
use crate::error::Error;
use crate::login;

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Create the data directory and the encryption key
    Init,

    /// Register a local account for a Salesforce user
    Register {
        /// Salesforce username
        #[arg(short, long)]
        username: String,
        /// Salesforce password
        #[arg(long, env = "SFDESK_PASSWORD", hide_env_values = true)]
        password: String,
        /// Security token appended to the password at login
        #[arg(long, env = "SFDESK_SECURITY_TOKEN", hide_env_values = true, default_value = "")]
        security_token: String,
        /// Connected app consumer key (OAuth fallback)
        #[arg(long, default_value = "")]
        client_id: String,
        /// Connected app consumer secret (OAuth fallback)
        #[arg(long, env = "SFDESK_CLIENT_SECRET", hide_env_values = true, default_value = "")]
        client_secret: String,
        /// login (production) or test (sandbox)
        #[arg(long, default_value = "login")]
        domain: String,
        /// Six-digit PIN asked at every login
        #[arg(long, env = "SFDESK_PIN", hide_env_values = true)]
        pin: String,
        /// Display name
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
    },

    /// Log in and keep the session for later commands
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(long, env = "SFDESK_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, env = "SFDESK_PIN", hide_env_values = true)]
        pin: String,
    },

    /// Forget the current session
    Logout,

    /// Show the logged-in user and idle time left
    Whoami,

    /// List registered accounts sharing an email address
    Orgs {
        #[arg(long)]
        email: String,
    },

    /// Change profile details of a registered account
    Profile {
        #[arg(short, long)]
        username: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        security_token: Option<String>,
        #[arg(long)]
        client_id: Option<String>,
        #[arg(long)]
        client_secret: Option<String>,
        #[arg(long)]
        domain: Option<String>,
        /// New six-digit PIN
        #[arg(long)]
        pin: Option<String>,
    },

    /// Remove a registered account
    Unregister {
        #[arg(short, long)]
        username: String,
        #[arg(long, env = "SFDESK_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, env = "SFDESK_PIN", hide_env_values = true)]
        pin: String,
    },
}

pub async fn run(config: &AppConfig, command: AccountCommand) -> anyhow::Result<()> {
    let mut out = io::stdout();
    match command {
        AccountCommand::Init => {
            if config.init()? {
                writeln!(out, "Initialized {}", config.home.display())?;
            } else {
                writeln!(out, "Already initialized: {}", config.home.display())?;
            }
        }
        AccountCommand::Register {
            username,
            password,
            security_token,
            client_id,
            client_secret,
            domain,
            pin,
            name,
            email,
        } => {
            let creds = UserCredentials::new(username, password, pin)
                .with_security_token(security_token)
                .with_connected_app(client_id, client_secret)
                .with_domain(domain.parse::<LoginDomain>().map_err(Error::from)?)
                .with_profile(name, email);
            let store = config.open_store()?;
            if store.register(&creds)? {
                writeln!(out, "Registered {}.", creds.username)?;
            } else {
                anyhow::bail!("username {} is already registered", creds.username);
            }
        }
        AccountCommand::Login {
            username,
            password,
            pin,
        } => {
            let store = config.open_store()?;
            let factory = config.session_factory()?;
            let mut context = config.session_context()?;
            let session =
                login::login(&*store, &factory, &mut context, &username, &password, &pin).await?;
            writeln!(
                out,
                "Logged in as {} to {} ({}).",
                session.username, session.instance_url, session.login_method
            )?;
        }
        AccountCommand::Logout => {
            config.session_context()?.clear()?;
            writeln!(out, "Logged out.")?;
        }
        AccountCommand::Whoami => {
            let mut context = config.session_context()?;
            let session = context.current()?.clone();
            let remaining = context.remaining().map(|d| d.num_minutes()).unwrap_or(0);
            writeln!(out, "{} on {}", session.username, session.instance_url)?;
            writeln!(out, "Logged in with {} at {}", session.login_method, session.established_at)?;
            writeln!(out, "Session idles out in {remaining} min")?;
        }
        AccountCommand::Orgs { email } => {
            let orgs = config.open_store()?.list_by_email(&email)?;
            if orgs.is_empty() {
                writeln!(out, "No accounts registered for {email}.")?;
            }
            for org in orgs {
                writeln!(out, "{:<40}  {:<24}  {}", org.username, org.name, org.domain)?;
            }
        }
        AccountCommand::Profile {
            username,
            name,
            email,
            security_token,
            client_id,
            client_secret,
            domain,
            pin,
        } => {
            let update = ProfileUpdate {
                name,
                email,
                security_token,
                client_id,
                client_secret,
                domain: domain
                    .map(|d| d.parse::<LoginDomain>())
                    .transpose()
                    .map_err(Error::from)?,
                pin,
            };
            if update.is_empty() {
                anyhow::bail!("nothing to update");
            }
            if config.open_store()?.update_profile(&username, &update)? {
                writeln!(out, "Profile updated.")?;
            } else {
                anyhow::bail!("no account named {username}");
            }
        }
        AccountCommand::Unregister {
            username,
            password,
            pin,
        } => {
            let store = config.open_store()?;
            if !store.verify(&username, &password, &pin)? {
                anyhow::bail!("{}", login::INVALID_LOGIN);
            }
            store.delete(&username)?;
            writeln!(out, "Removed {username}.")?;
        }
    }
    Ok(())
}
