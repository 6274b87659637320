//! End-to-end runs over real HTTP against a wiremock stand-in for the helper.

use async_trait::async_trait;
use serde_json::json;
use spotremote_core::WebHelperConfig;
use std::sync::{Arc, Mutex};
use url::Url;
use webhelper::process::UnsupportedPlatform;
use webhelper::{
    AuthError, HelperEndpoints, ReqwestTransport, Transport, TransportError, TransportResponse,
    WebHelper, WebHelperError,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Sends randomized helper hosts to the mock server on 127.0.0.1 and keeps
/// the hosts that were asked for.
#[derive(Clone)]
struct LoopbackTransport {
    inner: ReqwestTransport,
    hosts: Arc<Mutex<Vec<String>>>,
}

impl LoopbackTransport {
    fn new() -> Self {
        Self {
            inner: ReqwestTransport::new(false).unwrap(),
            hosts: Arc::default(),
        }
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn get(
        &self,
        url: &Url,
        headers: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError> {
        let mut target = url.clone();
        if let Some(host) = url.host_str() {
            self.hosts.lock().unwrap().push(host.to_string());
            if host.ends_with(".spotilocal.com") {
                target.set_host(Some("127.0.0.1")).unwrap();
            }
        }
        self.inner.get(&target, headers).await
    }
}

async fn setup(server: &MockServer) -> (WebHelper, LoopbackTransport) {
    let transport = LoopbackTransport::new();
    let endpoints = HelperEndpoints {
        scheme: "http".into(),
        oauth_url: format!("{}/token", server.uri()),
        ..HelperEndpoints::default()
    };
    let config = WebHelperConfig {
        port: Some(server.address().port()),
        start_delay_ms: 0,
        probe_timeout_ms: 200,
        ..WebHelperConfig::default()
    };
    let helper = WebHelper::builder(config)
        .endpoints(endpoints)
        .transport(transport.clone())
        .inspector(UnsupportedPlatform)
        .build()
        .unwrap();
    (helper, transport)
}

async fn mount_tokens(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"t": "oauth-1"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/simplecsrf/token.json"))
        .and(header("origin", "https://open.spotify.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "csrf-1"})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn connects_and_controls_over_http() {
    let server = MockServer::start().await;
    mount_tokens(&server).await;
    Mock::given(method("GET"))
        .and(path("/remote/status.json"))
        .and(query_param("csrf", "csrf-1"))
        .and(query_param("oauth", "oauth-1"))
        .and(header("origin", "https://open.spotify.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "playing": true,
            "volume": 0.8,
            "playing_position": 30.25
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/remote/pause.json"))
        .and(query_param("pause", "true"))
        .and(query_param("csrf", "csrf-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "playing": false,
            "volume": 0.8,
            "playing_position": 30.5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (helper, transport) = setup(&server).await;
    let url = helper.connect(true).await.expect("connect");
    assert_eq!(url, format!("http://127.0.0.1:{}", server.address().port()));

    let status = helper.status(None).await.expect("status");
    assert!(status.playing);
    assert_eq!(status.volume, 80);
    assert_eq!(status.position_seconds, 30.25);
    assert!(status.current.is_none());

    let paused = helper.pause(true).await.expect("pause");
    assert!(!paused.playing);

    let hosts = transport.hosts.lock().unwrap().clone();
    let helper_hosts: Vec<_> = hosts
        .iter()
        .filter(|h| h.ends_with(".spotilocal.com"))
        .collect();
    assert_eq!(helper_hosts.len(), 3);
    assert_ne!(helper_hosts[0], helper_hosts[1]);
    assert_ne!(helper_hosts[1], helper_hosts[2]);
}

#[tokio::test]
async fn csrf_rejection_fails_authentication() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"t": "oauth-1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/simplecsrf/token.json"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let (helper, _) = setup(&server).await;
    let err = helper.connect(false).await.unwrap_err();
    assert!(matches!(
        err,
        WebHelperError::AuthenticationFailed(AuthError::Status { status: 403, .. })
    ));
    assert!(!helper.is_connected().await);
}

#[tokio::test]
async fn token_page_without_token_fails_authentication() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"other": 1})))
        .mount(&server)
        .await;

    let (helper, _) = setup(&server).await;
    let err = helper.connect(false).await.unwrap_err();
    assert!(matches!(
        err,
        WebHelperError::AuthenticationFailed(AuthError::MissingToken { .. })
    ));
}

#[tokio::test]
async fn non_json_status_is_status_request_failure() {
    let server = MockServer::start().await;
    mount_tokens(&server).await;
    Mock::given(method("GET"))
        .and(path("/remote/status.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let (helper, _) = setup(&server).await;
    helper.connect(false).await.expect("connect");

    let err = helper.raw_status().await.unwrap_err();
    assert!(matches!(err, WebHelperError::StatusRequestFailed(_)));
    assert!(helper.is_connected().await);
}
