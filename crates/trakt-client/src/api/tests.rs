use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use url::Url;

use super::*;
use crate::request::ApiRequest;
use crate::testing::{ScriptedTransport, json_response};

const TOKEN_OK: &str = r#"{"access_token":"new-access","refresh_token":"new-refresh","expires_in":7776000,"token_type":"bearer"}"#;

fn client_with(transport: Arc<ScriptedTransport>) -> TraktClient {
    let config = TraktConfig::new("client".into(), "secret".into(), "http://localhost/cb".into());
    TraktClient::with_transport(config, transport).unwrap()
}

async fn authorized(transport: Arc<ScriptedTransport>) -> TraktClient {
    let client = client_with(transport);
    client
        .set_credential(Some(Credential {
            access_token: "old-access".into(),
            refresh_token: "old-refresh".into(),
        }))
        .await;
    client
}

fn response(status: u16, body: &str) -> ApiResponse {
    let req = ApiRequest::post(Url::parse("https://api-v2launch.trakt.tv/checkin").unwrap());
    json_response(&req, status, body)
}

#[test]
fn checkin_conflict_only_for_409() {
    let conflict = detect_checkin_conflict(&response(
        409,
        r#"{"expires_at":"2014-10-15T22:21:29.000Z"}"#,
    ))
    .unwrap()
    .unwrap();
    assert_eq!(conflict.expires_at.to_rfc3339(), "2014-10-15T22:21:29+00:00");

    for status in [200, 201, 400, 401, 404, 422, 500, 503] {
        assert!(detect_checkin_conflict(&response(status, "{}")).unwrap().is_none());
    }
}

#[test]
fn checkin_conflict_with_bad_body_is_decode_error() {
    let err = detect_checkin_conflict(&response(409, "not json")).unwrap_err();
    assert!(matches!(err, TraktError::Json(_)));
}

#[tokio::test]
async fn unauthorized_request_is_refreshed_and_retried_once() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push(|req| json_response(req, 401, ""));
    transport.push(|req| json_response(req, 200, TOKEN_OK));
    transport.push(|req| json_response(req, 200, r#"{"user":{"username":"sean"}}"#));
    let client = authorized(transport.clone()).await;

    let body: serde_json::Value = client.get_json("users/settings").await.unwrap();
    assert_eq!(body["user"]["username"], "sean");

    let sent = transport.requests();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].headers[AUTHORIZATION], "Bearer old-access");
    assert_eq!(sent[1].url.as_str(), "https://trakt.tv/oauth/token");
    assert!(!sent[1].headers.contains_key("trakt-api-key"));
    assert_eq!(sent[2].headers[AUTHORIZATION], "Bearer new-access");
    assert_eq!(sent[2].headers["trakt-api-key"], "client");
    assert_eq!(sent[2].attempt, 2);
    assert_eq!(transport.count_path("/token"), 1);

    let stored = client.credential().await.unwrap();
    assert_eq!(stored.access_token, "new-access");
    assert_eq!(stored.refresh_token, "new-refresh");
}

#[tokio::test]
async fn rejected_retry_surfaces_unauthorized() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push(|req| json_response(req, 401, ""));
    transport.push(|req| json_response(req, 200, TOKEN_OK));
    transport.push(|req| json_response(req, 401, "still no"));
    let client = authorized(transport.clone()).await;

    let err = client
        .get_json::<serde_json::Value>("users/settings")
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(transport.requests().len(), 3);
}

#[tokio::test]
async fn unauthorized_without_credential_is_returned_as_is() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push(|req| json_response(req, 401, ""));
    let client = client_with(transport.clone());

    let url = Url::parse("https://api-v2launch.trakt.tv/sync/history").unwrap();
    let resp = client.execute(ApiRequest::get(url)).await.unwrap();
    assert_eq!(resp.status, 401);
    assert_eq!(transport.requests().len(), 1);
    assert!(!transport.requests()[0].headers.contains_key(AUTHORIZATION));
}

#[tokio::test]
async fn per_request_authorization_override_is_kept() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push(|req| json_response(req, 200, "{}"));
    let client = authorized(transport.clone()).await;

    let url = Url::parse("https://api-v2launch.trakt.tv/users/me").unwrap();
    let req = ApiRequest::get(url).header(AUTHORIZATION, HeaderValue::from_static("Bearer other-user"));
    client.execute(req).await.unwrap();

    assert_eq!(transport.requests()[0].headers[AUTHORIZATION], "Bearer other-user");
}

#[tokio::test]
async fn rejected_authorization_override_refreshes_stored_token() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push(|req| json_response(req, 401, ""));
    transport.push(|req| json_response(req, 200, TOKEN_OK));
    transport.push(|req| json_response(req, 200, "{}"));
    let client = authorized(transport.clone()).await;

    let url = Url::parse("https://api-v2launch.trakt.tv/users/me").unwrap();
    let req = ApiRequest::get(url).header(AUTHORIZATION, HeaderValue::from_static("Bearer other-user"));
    let resp = client.execute(req).await.unwrap();

    assert_eq!(resp.status, 200);
    let sent = transport.requests();
    assert_eq!(sent.len(), 3);
    assert_eq!(transport.count_path("/token"), 1);
    assert_eq!(sent[2].headers[AUTHORIZATION], "Bearer new-access");
}

#[tokio::test]
async fn foreign_host_is_not_decorated_or_refreshed() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push(|req| json_response(req, 401, ""));
    let client = authorized(transport.clone()).await;

    let url = Url::parse("https://example.com/api").unwrap();
    let resp = client.execute(ApiRequest::get(url)).await.unwrap();

    assert_eq!(resp.status, 401);
    let sent = transport.requests();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].headers.is_empty());
}

#[tokio::test]
async fn exchange_code_stores_tokens() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push(|req| json_response(req, 200, TOKEN_OK));
    let client = client_with(transport);

    let token = client.exchange_code_for_token("code").await.unwrap();
    assert_eq!(token.access_token, "new-access");
    assert_eq!(
        client.credential().await,
        Some(Credential {
            access_token: "new-access".into(),
            refresh_token: "new-refresh".into(),
        })
    );
}

#[tokio::test]
async fn exchange_code_waits_for_refresh_guard() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push(|req| json_response(req, 200, TOKEN_OK));
    let client = client_with(transport.clone());

    let record = client.credentials.refresh_guard().await;
    let blocked = tokio::time::timeout(
        Duration::from_millis(50),
        client.exchange_code_for_token("code"),
    )
    .await;
    assert!(blocked.is_err());
    assert!(transport.requests().is_empty());
    drop(record);

    client.exchange_code_for_token("code").await.unwrap();
    assert_eq!(client.credentials.refresh_generation(), 1);
    assert_eq!(
        client.credentials.refresh_guard().await.last_access_token(),
        Some("new-access")
    );
}

#[tokio::test]
async fn failed_manual_refresh_is_recorded() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push(|req| json_response(req, 400, r#"{"error":"invalid_grant"}"#));
    let client = authorized(transport).await;

    let err = client.refresh_access_token().await.unwrap_err();
    assert!(matches!(err, TraktError::AuthExchange { status: 400, .. }));
    assert_eq!(client.credentials.refresh_generation(), 1);
    assert!(client.credentials.refresh_guard().await.last_access_token().is_none());
    assert_eq!(client.credential().await.unwrap().access_token, "old-access");
}

#[tokio::test]
async fn refresh_without_credential_requires_auth() {
    let client = client_with(Arc::new(ScriptedTransport::default()));
    assert!(matches!(
        client.refresh_access_token().await,
        Err(TraktError::AuthRequired)
    ));
}

#[tokio::test]
async fn revoke_forgets_credential() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push(|req| json_response(req, 200, ""));
    let client = authorized(transport.clone()).await;

    client.revoke_access_token().await.unwrap();
    assert!(client.credential().await.is_none());
    assert_eq!(transport.count_path("/revoke"), 1);
}

#[tokio::test]
async fn movie_checkin_conflict_is_error() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push(|req| json_response(req, 409, r#"{"expires_at":"2014-10-15T22:21:29.000Z"}"#));
    let client = authorized(transport.clone()).await;

    let checkin = MovieCheckin {
        movie: MovieRef {
            title: Some("Guardians of the Galaxy".into()),
            year: Some(2014),
            ids: Ids::trakt(28),
        },
        sharing: None,
        message: None,
        app_version: None,
        app_date: None,
    };
    let err = client.checkin().checkin_movie(&checkin).await.unwrap_err();
    assert!(matches!(err, TraktError::CheckinConflict(_)));

    let body: serde_json::Value =
        serde_json::from_slice(transport.requests()[0].body.as_ref().unwrap()).unwrap();
    assert_eq!(body["movie"]["ids"]["trakt"], 28);
    assert!(body.get("sharing").is_none());
}

#[tokio::test]
async fn episode_checkin_decodes_response() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push(|req| {
        json_response(
            req,
            201,
            r#"{"id":3373536620,"watched_at":"2014-08-06T06:54:36.859Z","sharing":{"facebook":true,"twitter":true,"tumblr":false},"episode":{"season":1,"number":1,"title":"Pilot","ids":{"trakt":16}},"show":{"title":"Breaking Bad","year":2008,"ids":{"trakt":1,"slug":"breaking-bad"}}}"#,
        )
    });
    let client = authorized(transport).await;

    let checkin = EpisodeCheckin {
        episode: EpisodeRef {
            ids: Ids::trakt(16),
            ..EpisodeRef::default()
        },
        show: None,
        sharing: Some(ShareSettings::default()),
        message: Some("Pilot!".into()),
        app_version: None,
        app_date: None,
    };
    let resp = client.checkin().checkin_episode(&checkin).await.unwrap();
    assert_eq!(resp.id, 3373536620);
    assert_eq!(resp.episode.title.as_deref(), Some("Pilot"));
    assert_eq!(resp.show.unwrap().ids.slug.as_deref(), Some("breaking-bad"));
}

#[tokio::test]
async fn delete_active_checkin_uses_delete() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push(|req| json_response(req, 204, ""));
    let client = authorized(transport.clone()).await;

    client.checkin().delete_active_checkin().await.unwrap();
    let sent = transport.requests();
    assert_eq!(sent[0].method, crate::HttpMethod::Delete);
    assert_eq!(sent[0].url.as_str(), "https://api-v2launch.trakt.tv/checkin");
}
