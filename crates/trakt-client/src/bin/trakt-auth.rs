//! Manual OAuth helper for trakt.
//!
//! Reads `TRAKT_CLIENT_ID`, `TRAKT_CLIENT_SECRET` and `TRAKT_REDIRECT_URI`
//! (a `.env` file is honoured) and runs one step of the token lifecycle:
//!
//! ```text
//! trakt-auth url
//! trakt-auth exchange <code>
//! trakt-auth refresh <refresh_token>
//! trakt-auth revoke <access_token>
//! ```

use anyhow::{Context, bail};
use tracing_subscriber::EnvFilter;

use trakt_client::{Credential, TraktClient, TraktConfig};

const USAGE: &str = "usage: trakt-auth <url | exchange <code> | refresh <refresh_token> | revoke <access_token>>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env loaded: {e}");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = TraktConfig::from_env().context("invalid trakt configuration")?;
    let client = TraktClient::new(config)?;

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["url"] => {
            let auth = client.build_authorization_url().await;
            println!("{}", auth.url);
            eprintln!("state: {}", auth.state);
        }
        ["exchange", code] => {
            let token = client
                .exchange_code_for_token(code)
                .await
                .context("authorization code exchange failed")?;
            println!("{}", serde_json::to_string_pretty(&token)?);
        }
        ["refresh", refresh_token] => {
            client
                .set_credential(Some(Credential {
                    access_token: String::new(),
                    refresh_token: refresh_token.to_string(),
                }))
                .await;
            let token = client
                .refresh_access_token()
                .await
                .context("token refresh failed, re-authorization required")?;
            println!("{}", serde_json::to_string_pretty(&token)?);
        }
        ["revoke", access_token] => {
            client
                .set_credential(Some(Credential {
                    access_token: access_token.to_string(),
                    refresh_token: String::new(),
                }))
                .await;
            client.revoke_access_token().await.context("revocation failed")?;
            tracing::info!("Access token revoked");
        }
        _ => bail!(USAGE),
    }

    Ok(())
}
