//! Fetch-token command.
//!
//! Exchanges the one-time authorization code for an access token and
//! writes it into the env file as `ACCESS_TOKEN=<token>`. A failed exchange
//! is logged; the command still exits successfully.

use anyhow::{Context, Result};
use clap::Args;
use margin_scout_core::{AppConfig, EnvStore, UpsertOutcome};
use margin_scout_upstox::{UpstoxAuth, UpstoxAuthConfig, UpstoxCredentials};

/// Arguments for the fetch-token command.
#[derive(Args, Debug, Clone)]
pub struct FetchTokenArgs {
    /// Redirect URI registered with the app (defaults to upstox.redirect_uri)
    #[arg(long)]
    pub redirect_uri: Option<String>,
}

/// Runs the fetch-token command.
///
/// # Errors
/// Returns an error only for local setup problems (missing credentials,
/// bad config, unwritable env file). HTTP failures are logged.
pub async fn run_fetch_token(args: FetchTokenArgs, config: &AppConfig) -> Result<()> {
    let auth_config = UpstoxAuthConfig::default();
    let redirect_uri = args
        .redirect_uri
        .unwrap_or_else(|| config.upstox.redirect_uri.clone());

    let credentials = UpstoxCredentials::from_env(&auth_config, redirect_uri)
        .context("API_KEY, API_SECRET and CODE must be set")?;
    let auth = UpstoxAuth::new(&super::client_config(&config.upstox)?)?;
    let store = EnvStore::new(&config.report.env_file);

    if let Some(outcome) =
        fetch_and_store(&auth, &credentials, &store, &auth_config.access_token_env).await?
    {
        tracing::info!(
            "{} {} in {}",
            auth_config.access_token_env,
            describe(&outcome),
            store.path().display()
        );
    }

    Ok(())
}

/// Exchanges the code and upserts the token under `key`.
///
/// Returns `Ok(None)` when the exchange failed; the failure is logged here.
pub(crate) async fn fetch_and_store(
    auth: &UpstoxAuth,
    credentials: &UpstoxCredentials,
    store: &EnvStore,
    key: &str,
) -> Result<Option<UpsertOutcome>> {
    let token = match auth.exchange_code(credentials).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Error fetching access token: {}", e);
            return Ok(None);
        }
    };

    let outcome = store
        .upsert(key, token.expose())
        .with_context(|| format!("Failed to write {}", store.path().display()))?;
    Ok(Some(outcome))
}

fn describe(outcome: &UpsertOutcome) -> String {
    match outcome {
        UpsertOutcome::Inserted => "added".to_string(),
        UpsertOutcome::Replaced {
            duplicates_removed: 0,
        } => "updated".to_string(),
        UpsertOutcome::Replaced { duplicates_removed } => {
            format!("updated ({duplicates_removed} duplicate line(s) removed)")
        }
        UpsertOutcome::Unchanged => "already up to date".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use margin_scout_upstox::UpstoxClientConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> UpstoxCredentials {
        UpstoxCredentials::new("key", "secret", "code", "https://127.0.0.2")
    }

    async fn token_server(status: u16, body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/authorization/token"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    fn auth_for(server: &MockServer) -> UpstoxAuth {
        UpstoxAuth::new(&UpstoxClientConfig::default().with_base_url(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_token_is_appended_once() {
        let server = token_server(200, serde_json::json!({"access_token": "abc123"})).await;
        let dir = tempfile::TempDir::new().unwrap();
        let store = EnvStore::new(dir.path().join(".env"));
        std::fs::write(store.path(), "API_KEY=key\n").unwrap();

        let outcome = fetch_and_store(&auth_for(&server), &credentials(), &store, "ACCESS_TOKEN")
            .await
            .unwrap();

        assert_eq!(outcome, Some(UpsertOutcome::Inserted));
        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents.matches("ACCESS_TOKEN=abc123").count(), 1);
        assert!(contents.starts_with("API_KEY=key\n"));
    }

    #[tokio::test]
    async fn test_rerun_replaces_token() {
        let server = token_server(200, serde_json::json!({"access_token": "fresh"})).await;
        let dir = tempfile::TempDir::new().unwrap();
        let store = EnvStore::new(dir.path().join(".env"));
        std::fs::write(store.path(), "ACCESS_TOKEN=stale\n").unwrap();

        fetch_and_store(&auth_for(&server), &credentials(), &store, "ACCESS_TOKEN")
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "ACCESS_TOKEN=fresh\n"
        );
    }

    #[tokio::test]
    async fn test_failed_exchange_leaves_store_untouched() {
        let server = token_server(400, serde_json::json!({"status": "error"})).await;
        let dir = tempfile::TempDir::new().unwrap();
        let store = EnvStore::new(dir.path().join(".env"));

        let outcome = fetch_and_store(&auth_for(&server), &credentials(), &store, "ACCESS_TOKEN")
            .await
            .unwrap();

        assert!(outcome.is_none());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_missing_token_field_is_logged_not_raised() {
        let server = token_server(200, serde_json::json!({"user_id": "AB1234"})).await;
        let dir = tempfile::TempDir::new().unwrap();
        let store = EnvStore::new(dir.path().join(".env"));

        let outcome = fetch_and_store(&auth_for(&server), &credentials(), &store, "ACCESS_TOKEN")
            .await
            .unwrap();

        assert!(outcome.is_none());
    }

    #[test]
    fn test_describe_outcomes() {
        assert_eq!(describe(&UpsertOutcome::Inserted), "added");
        assert_eq!(
            describe(&UpsertOutcome::Replaced {
                duplicates_removed: 2
            }),
            "updated (2 duplicate line(s) removed)"
        );
    }
}
