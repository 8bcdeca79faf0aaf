use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of a 409 checkin response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinConflict {
    /// When the checkin already in progress expires.
    pub expires_at: DateTime<Utc>,
}

/// Identifiers of a movie, show or episode. At least one should be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ids {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trakt: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvdb: Option<u64>,
}

impl Ids {
    pub fn trakt(id: u64) -> Self {
        Self {
            trakt: Some(id),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    pub ids: Ids,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    pub ids: Ids,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub ids: Ids,
}

/// Where a checkin is shared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareSettings {
    #[serde(default)]
    pub facebook: bool,
    #[serde(default)]
    pub twitter: bool,
    #[serde(default)]
    pub tumblr: bool,
}

/// Request body for POST /checkin with a movie.
#[derive(Debug, Clone, Serialize)]
pub struct MovieCheckin {
    pub movie: MovieRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharing: Option<ShareSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_date: Option<String>,
}

/// Request body for POST /checkin with an episode.
///
/// `show` is only needed when the episode is given by season/number.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeCheckin {
    pub episode: EpisodeRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<ShowRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharing: Option<ShareSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovieCheckinResponse {
    pub id: u64,
    pub watched_at: DateTime<Utc>,
    #[serde(default)]
    pub sharing: Option<ShareSettings>,
    pub movie: MovieRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EpisodeCheckinResponse {
    pub id: u64,
    pub watched_at: DateTime<Utc>,
    #[serde(default)]
    pub sharing: Option<ShareSettings>,
    pub episode: EpisodeRef,
    #[serde(default)]
    pub show: Option<ShowRef>,
}
