use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use std::sync::Arc;

use storefront_client::api::{AddressApi, CatalogApi, UserApi};
use storefront_client::auth::{
    CredentialStore, MemoryCredentialStore, SessionManager, SqliteCredentialStore,
};
use storefront_client::config::{Command, Config};
use storefront_client::error::ClientError;
use storefront_client::http_client::StorefrontHttpClient;
use storefront_client::models::{AddressRequest, ProductQuery};

#[tokio::main]
async fn main() -> Result<()> {
    let (config, command) = Config::load()?;
    config.validate()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Base URL: {}", config.base_url);

    let store: Arc<dyn CredentialStore> = match config.store_path {
        Some(ref path) => Arc::new(SqliteCredentialStore::open(path)?),
        None => {
            tracing::debug!("Using in-memory session store");
            Arc::new(MemoryCredentialStore::new())
        }
    };

    let http = Arc::new(StorefrontHttpClient::new(&config, store)?);

    if let Err(e) = run(command, http).await {
        if let Some(client_err) = e.downcast_ref::<ClientError>() {
            if client_err.requires_login() {
                eprintln!("Your session has ended. Run `storefront login` to sign in again.");
            }
        }
        return Err(e);
    }

    Ok(())
}

async fn run(command: Command, http: Arc<StorefrontHttpClient>) -> Result<()> {
    let session = SessionManager::new(http.clone());

    match command {
        Command::Login { email, password } => {
            let password = password_or_prompt(password, "Password")?;
            match session.login(&email, &password).await? {
                Some(user) => println!("Logged in as {} <{}>", user.name, user.email),
                None => println!("Logged in as {}", email),
            }
        }

        Command::Register {
            name,
            email,
            password,
            dob,
        } => {
            let password = password_or_prompt(password, "Choose a password")?;
            let resp = session
                .register(&name, &email, &password, dob.as_deref())
                .await?;
            println!("{}", message_or(&resp.message, "Registered"));
            println!("Check {} for a one-time code, then run `storefront verify-otp`", email);
        }

        Command::VerifyOtp { otp } => {
            let otp = match otp {
                Some(otp) => otp,
                None => Input::new()
                    .with_prompt("One-time code")
                    .interact_text()
                    .context("Failed to read OTP")?,
            };
            session.verify_otp(&otp).await?;
            println!("Account activated, you are now logged in");
        }

        Command::ResendOtp => {
            let resp = session.resend_otp().await?;
            println!("{}", message_or(&resp.message, "A new code has been sent"));
        }

        Command::ForgotPassword { email } => {
            let resp = session.forgot_password(&email).await?;
            println!("{}", message_or(&resp.message, "Reset code sent"));
        }

        Command::ResetPassword {
            email,
            otp,
            password,
        } => {
            let password = password_or_prompt(password, "New password")?;
            let resp = session.reset_password(&email, &otp, &password).await?;
            println!("{}", message_or(&resp.message, "Password updated"));
        }

        Command::Logout => {
            session.logout().await?;
            println!("Logged out");
        }

        Command::Whoami => {
            if !session.is_logged_in()? {
                println!("Not logged in");
                return Ok(());
            }
            let user = UserApi::new(http).me().await?;
            println!("{} <{}>", user.name, user.email);
            println!("  id:   {}", user.id);
            println!("  role: {}", String::from(user.role));
            if let Some(dob) = user.dob {
                println!("  dob:  {}", dob);
            }
        }

        Command::Categories => {
            for category in CatalogApi::new(http).categories().await? {
                println!("{:<12} {}", category.id, category.name);
            }
        }

        Command::Products {
            category,
            search,
            page,
        } => {
            let listing = CatalogApi::new(http)
                .products(&ProductQuery {
                    category,
                    search,
                    page,
                })
                .await?;
            for product in &listing.items {
                println!(
                    "{:<12} {:>10.2}  {}{}",
                    product.id,
                    product.effective_price(),
                    product.name,
                    if product.in_stock() { "" } else { " (out of stock)" }
                );
            }
            if listing.has_more() {
                let next = listing.page.saturating_add(1);
                println!(
                    "-- page {} of {}, use --page {} for more",
                    next, listing.total_pages, next
                );
            }
        }

        Command::Product { id } => {
            let product = CatalogApi::new(http).product(&id).await?;
            println!("{}", serde_json::to_string_pretty(&product)?);
        }

        Command::Addresses => {
            for address in AddressApi::new(http).list().await? {
                println!(
                    "{}{:<12} {}",
                    if address.is_default { "*" } else { " " },
                    address.id,
                    address.one_line()
                );
            }
        }

        Command::AddAddress {
            label,
            line1,
            line2,
            city,
            state,
            postal_code,
            country,
            phone,
        } => {
            let address = AddressApi::new(http)
                .create(&AddressRequest {
                    label,
                    line1,
                    line2,
                    city,
                    state,
                    postal_code,
                    country,
                    phone,
                })
                .await?;
            println!("Saved address {}", address.id);
        }

        Command::RemoveAddress { id } => {
            AddressApi::new(http).delete(&id).await?;
            println!("Removed address {}", id);
        }

        Command::DefaultAddress { id } => {
            let address = AddressApi::new(http).set_default(&id).await?;
            println!("Default address: {}", address.one_line());
        }
    }

    Ok(())
}

fn password_or_prompt(password: Option<String>, prompt: &str) -> Result<String> {
    match password {
        Some(p) => Ok(p),
        None => Password::new()
            .with_prompt(prompt)
            .interact()
            .context("Failed to read password"),
    }
}

fn message_or<'a>(message: &'a str, fallback: &'a str) -> &'a str {
    if message.is_empty() {
        fallback
    } else {
        message
    }
}
