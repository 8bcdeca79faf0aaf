use serde::Serialize;
use serde::de::DeserializeOwned;

use super::*;

/// Checking in is the manual way to mark something as watching now.
/// All endpoints require OAuth.
pub struct Checkin<'a> {
    client: &'a TraktClient,
}

impl<'a> Checkin<'a> {
    pub(super) fn new(client: &'a TraktClient) -> Self {
        Self { client }
    }

    /// Check into an episode.
    ///
    /// Fails with [`TraktError::CheckinConflict`] while another checkin is active.
    pub async fn checkin_episode(
        &self,
        checkin: &EpisodeCheckin,
    ) -> Result<EpisodeCheckinResponse, TraktError> {
        self.post_checkin(checkin).await
    }

    /// Check into a movie.
    ///
    /// Fails with [`TraktError::CheckinConflict`] while another checkin is active.
    pub async fn checkin_movie(
        &self,
        checkin: &MovieCheckin,
    ) -> Result<MovieCheckinResponse, TraktError> {
        self.post_checkin(checkin).await
    }

    /// Remove any active checkin.
    pub async fn delete_active_checkin(&self) -> Result<(), TraktError> {
        self.client.delete("checkin").await
    }

    async fn post_checkin<B, T>(&self, body: &B) -> Result<T, TraktError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let resp = self.client.post_raw("checkin", body).await?;
        if let Some(conflict) = detect_checkin_conflict(&resp)? {
            tracing::info!(expires_at = %conflict.expires_at, "Checkin already in progress");
            return Err(TraktError::CheckinConflict(conflict));
        }
        resp.error_for_status()?.json()
    }
}
