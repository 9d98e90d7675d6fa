// ABOUTME: Process configuration from command-line flags with environment variable fallbacks
// ABOUTME: Every setting has a default so the service starts with no arguments

use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_MAX_PROOF_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(name = "smart-hosting", version, about = "Hosting storefront and admin backend")]
pub struct AppConfig {
    #[arg(long, env = "SMART_HOSTING_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "SMART_HOSTING_PORT", default_value_t = 3000)]
    pub port: u16,

    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:smart_hosting.db?mode=rwc")]
    pub database_url: String,

    /// Directory payment proofs are written to.
    #[arg(long, env = "SMART_HOSTING_BLOB_DIR", default_value = "./payment-proofs")]
    pub blob_dir: PathBuf,

    /// Base URL used when handing out payment proof links.
    #[arg(long, env = "SMART_HOSTING_PUBLIC_URL", default_value = "http://localhost:3000")]
    pub public_base_url: String,

    #[arg(long, env = "SMART_HOSTING_MAX_PROOF_BYTES", default_value_t = DEFAULT_MAX_PROOF_BYTES)]
    pub max_proof_bytes: usize,

    /// Mark the session cookie Secure (requires HTTPS).
    #[arg(long, env = "SMART_HOSTING_SECURE_COOKIES", default_value_t = false)]
    pub secure_cookies: bool,

    /// Email of the account promoted to super_admin at startup.
    #[arg(long, env = "SMART_HOSTING_SUPER_ADMIN")]
    pub bootstrap_super_admin: Option<String>,

    #[arg(long, env = "SMART_HOSTING_SESSION_MAX_AGE", default_value_t = 86_400)]
    pub session_max_age_secs: i64,
}

impl AppConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: "sqlite:smart_hosting.db?mode=rwc".to_string(),
            blob_dir: PathBuf::from("./payment-proofs"),
            public_base_url: "http://localhost:3000".to_string(),
            max_proof_bytes: DEFAULT_MAX_PROOF_BYTES,
            secure_cookies: false,
            bootstrap_super_admin: None,
            session_max_age_secs: 86_400,
        }
    }
}
