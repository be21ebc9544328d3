use clap::{Args, Parser, Subcommand};

/// Stride identity tooling.
#[derive(Parser, Debug)]
#[command(name = "stride", about = "Stride identity and admin-session tooling")]
pub struct Cli {
    #[command(flatten)]
    pub identity: IdentityArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Signed-in identity, usually supplied through the environment.
#[derive(Args, Debug, Clone)]
pub struct IdentityArgs {
    /// Secure-token endpoint that exchanges refresh credentials for identity tokens.
    #[arg(long, env = "STRIDE_IDENTITY_URL", global = true)]
    pub identity_url: Option<String>,

    /// Subject id of the signed-in user.
    #[arg(long, env = "STRIDE_SUBJECT", global = true)]
    pub subject: Option<String>,

    /// Refresh credential of the signed-in user.
    #[arg(long, env = "STRIDE_REFRESH_TOKEN", global = true, hide_env_values = true)]
    pub refresh_token: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the version.
    Version,

    /// Print the signed-in subject.
    Whoami,

    /// Print a current identity token.
    Token {
        /// Skip the cache and request a new token.
        #[arg(long)]
        force: bool,
    },

    /// Fetch the caller's admin session from the API.
    AdminSession {
        /// Base URL of the Stride API.
        #[arg(long, env = "STRIDE_API_URL", default_value = "http://127.0.0.1:3100")]
        api_url: String,
    },
}
