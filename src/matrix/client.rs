use matrix_sdk::matrix_auth::{MatrixSession, MatrixSessionTokens};
use matrix_sdk::ruma::{OwnedDeviceId, OwnedUserId};
use matrix_sdk::Client;

use crate::config::{self, StoredSession, APP_NAME};

pub async fn create_client(homeserver: &str) -> Result<Client, String> {
    let db_path = config::data_dir().join("matrix-store");

    Client::builder()
        .server_name_or_homeserver_url(homeserver)
        .sqlite_store(&db_path, None)
        .build()
        .await
        .map_err(|e| format!("Failed to create client for {homeserver}: {e}"))
}

/// Password login; the resulting session is written to the session file.
pub async fn login(homeserver: &str, username: &str, password: &str) -> Result<Client, String> {
    let client = create_client(homeserver).await?;
    client
        .matrix_auth()
        .login_username(username, password)
        .initial_device_display_name(APP_NAME)
        .await
        .map_err(|e| format!("Login failed: {e}"))?;

    let session = client
        .matrix_auth()
        .session()
        .ok_or_else(|| "Login returned no session".to_string())?;
    config::save_session(&StoredSession {
        homeserver: homeserver.to_string(),
        user_id: session.meta.user_id.to_string(),
        access_token: session.tokens.access_token.clone(),
        device_id: session.meta.device_id.to_string(),
    })?;

    tracing::info!("Logged in as {}", session.meta.user_id);
    Ok(client)
}

pub async fn restore_session(stored: &StoredSession) -> Result<Client, String> {
    let client = create_client(&stored.homeserver).await?;

    let user_id: OwnedUserId = stored
        .user_id
        .parse()
        .map_err(|e| format!("Invalid user_id in session: {e}"))?;
    let device_id: OwnedDeviceId = stored.device_id.as_str().into();

    let session = MatrixSession {
        meta: matrix_sdk::SessionMeta { user_id, device_id },
        tokens: MatrixSessionTokens {
            access_token: stored.access_token.clone(),
            refresh_token: None,
        },
    };

    client
        .restore_session(session)
        .await
        .map_err(|e| format!("Session restore failed: {e}"))?;

    Ok(client)
}

/// Restore the session saved by [`login`].
pub async fn restore_stored() -> Result<Client, String> {
    let stored = config::load_session()
        .ok_or_else(|| format!("No saved session at {}", config::session_path().display()))?;
    restore_session(&stored).await.inspect_err(|e| {
        tracing::warn!("Could not restore session for {}: {e}", stored.user_id);
    })
}
