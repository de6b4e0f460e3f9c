//! CLI commands

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use foodsched_client::types::{OAuthRegisterRequest, RegisterRequest};
use foodsched_client::{AccountService, Method, RequestContext};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with email and password and store the issued tokens
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "FOODSCHED_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log in an account registered through a social provider
    OauthLogin {
        #[arg(long)]
        email: String,

        /// Provider code (google, kakao, naver, ...)
        #[arg(long)]
        provider: String,

        /// Token issued by the provider
        #[arg(long)]
        provider_token: String,
    },

    /// Create an account
    Register {
        #[arg(long)]
        email: String,

        #[arg(long, env = "FOODSCHED_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        nickname: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },

    /// Create an account through a social provider
    OauthRegister {
        #[arg(long)]
        email: String,

        #[arg(long)]
        provider: String,

        #[arg(long)]
        provider_token: String,

        #[arg(long)]
        nickname: Option<String>,
    },

    /// Ask the backend to mail a verification code
    VerifyEmail {
        #[arg(long)]
        email: String,
    },

    /// Confirm a mailed verification code
    VerifyConfirm {
        #[arg(long)]
        email: String,

        #[arg(long)]
        code: String,
    },

    /// Show the logged in user
    Me,

    /// End the session and drop stored tokens
    Logout,

    /// Report whether an access token is stored
    Status,

    /// Send an arbitrary request through the authenticated client
    Request {
        method: HttpMethod,

        /// Endpoint path, relative to the base URL
        endpoint: String,

        /// JSON body for POST and PUT
        #[arg(long)]
        body: Option<String>,

        /// Do not send the stored access token
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

impl Commands {
    pub async fn execute(self, accounts: &AccountService) -> Result<()> {
        match self {
            Commands::Login { email, password } => {
                let response = accounts.login(&email, &password).await?;
                info!(expires_in = ?response.get("expires_in"), "Tokens stored");
                println!("Logged in as {email}");
            }
            Commands::OauthLogin {
                email,
                provider,
                provider_token,
            } => {
                let request = OAuthRegisterRequest {
                    email: email.clone(),
                    social_code: provider,
                    access_token: provider_token,
                    nickname: None,
                };
                accounts.oauth_login(&request).await?;
                println!("Logged in as {email}");
            }
            Commands::Register {
                email,
                password,
                nickname,
                phone,
            } => {
                let request = RegisterRequest {
                    email,
                    password,
                    nickname,
                    phone,
                };
                print_json(&accounts.register(&request).await?)?;
            }
            Commands::OauthRegister {
                email,
                provider,
                provider_token,
                nickname,
            } => {
                let request = OAuthRegisterRequest {
                    email,
                    social_code: provider,
                    access_token: provider_token,
                    nickname,
                };
                print_json(&accounts.oauth_register(&request).await?)?;
            }
            Commands::VerifyEmail { email } => {
                print_json(&accounts.request_verification(&email).await?)?;
            }
            Commands::VerifyConfirm { email, code } => {
                print_json(&accounts.confirm_verification(&email, &code).await?)?;
            }
            Commands::Me => {
                print_json(&accounts.me().await?)?;
            }
            Commands::Logout => {
                accounts.logout().await?;
                println!("Logged out");
            }
            Commands::Status => {
                let tokens = accounts.client().tokens();
                let state = if tokens.is_logged_in() {
                    "logged in"
                } else {
                    "logged out"
                };
                println!("{state}");
            }
            Commands::Request {
                method,
                endpoint,
                body,
                no_auth,
            } => {
                let mut context = RequestContext::new(method.into(), endpoint).require_auth(!no_auth);
                if let Some(body) = body {
                    let body: Value =
                        serde_json::from_str(&body).context("--body must be valid JSON")?;
                    context = context.with_json(&body)?;
                }
                print_json(&accounts.client().send(context).await?)?;
            }
        }

        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
