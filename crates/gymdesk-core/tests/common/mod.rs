#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use gymdesk_core::ApiClient;
use serde_json::Value;
use wiremock::MockServer;

/// Unsigned token carrying `claims`
pub fn token(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.sig", header, payload)
}

/// Client against the mock server, authenticated with `token`
pub fn client(server: &MockServer, token: &str) -> ApiClient {
    let mut api = ApiClient::new(&format!("{}/api", server.uri())).unwrap();
    api.set_token(token);
    api
}

pub fn values(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}
