use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Storefront - command-line client for the storefront API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Base URL of the storefront API
    #[arg(short = 'u', long, env = "STOREFRONT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Path to the session SQLite database
    #[arg(short = 's', long, env = "STOREFRONT_STORE")]
    pub store: Option<String>,

    /// Keep the session in memory only
    #[arg(long, env = "STOREFRONT_EPHEMERAL", default_value = "false")]
    pub ephemeral: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "10")]
    pub connect_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        email: String,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account; an OTP is sent to the email
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: Option<String>,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: Option<String>,
    },
    /// Activate the pending registration with the emailed OTP
    VerifyOtp {
        otp: Option<String>,
    },
    /// Send a new OTP for the pending registration
    ResendOtp,
    /// Request a password reset OTP
    ForgotPassword {
        #[arg(short, long)]
        email: String,
    },
    /// Set a new password using a reset OTP
    ResetPassword {
        #[arg(short, long)]
        email: String,
        #[arg(long)]
        otp: String,
        #[arg(short, long)]
        password: Option<String>,
    },
    /// End the session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List product categories
    Categories,
    /// List products
    Products {
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        page: Option<u32>,
    },
    /// Show one product
    Product {
        id: String,
    },
    /// List saved addresses
    Addresses,
    /// Save a new address
    AddAddress {
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        line1: String,
        #[arg(long)]
        line2: Option<String>,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        postal_code: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Delete a saved address
    RemoveAddress {
        id: String,
    },
    /// Make an address the default
    DefaultAddress {
        id: String,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,

    /// `None` keeps the session in memory
    pub store_path: Option<PathBuf>,

    // HTTP client
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    pub log_level: String,
}

impl Config {
    /// Load configuration with priority: CLI > ENV > .env > defaults
    pub fn load() -> Result<(Self, Command)> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        let config = Self::from_args(&args)?;
        Ok((config, args.command))
    }

    /// Build a config from already-parsed arguments
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let store_path = if args.ephemeral {
            None
        } else {
            Some(match args.store {
                Some(ref s) => expand_tilde(s),
                None => default_store_path()
                    .context("Cannot locate a data directory; pass --store or --ephemeral")?,
            })
        };

        Ok(Config {
            base_url: args.base_url.trim_end_matches('/').to_string(),
            store_path,
            http_connect_timeout: args.connect_timeout,
            http_request_timeout: args.request_timeout,
            log_level: args.log_level.clone(),
        })
    }

    /// Config pointing at `base_url` with an in-memory session
    pub fn for_base_url(base_url: &str) -> Self {
        Config {
            base_url: base_url.trim_end_matches('/').to_string(),
            store_path: None,
            http_connect_timeout: 10,
            http_request_timeout: 30,
            log_level: "warn".to_string(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base URL: {}", self.base_url))?;

        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("Base URL must be http or https: {}", self.base_url);
        }

        if self.http_request_timeout == 0 {
            anyhow::bail!("HTTP_REQUEST_TIMEOUT must be greater than zero");
        }

        Ok(())
    }

    /// Absolute URL for an API path such as `/auth/login`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Default location of the session database
fn default_store_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("storefront").join("session.sqlite3"))
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
