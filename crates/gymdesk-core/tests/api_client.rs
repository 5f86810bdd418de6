mod common;

use gymdesk_core::api::api_error;
use gymdesk_core::auth::Role;
use gymdesk_core::models::{Member, MemberStatus, Package};
use gymdesk_core::{ApiClient, ApiError, PageQuery};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{client, token};

#[tokio::test]
async fn login_decodes_role_and_gym() {
    let server = MockServer::start().await;
    let jwt = token(json!({"sub": "9", "role": "STAFF", "gymId": 4, "name": "Sam"}));

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "sam@gym.test", "password": "hunter22"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"accessToken": jwt})))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&format!("{}/api/", server.uri())).unwrap();
    let session = api.login("sam@gym.test", "hunter22").await.unwrap();

    assert_eq!(session.role(), Some(Role::Staff));
    assert_eq!(session.gym_id(), Some(4));
    assert_eq!(session.display_name(), "Sam");
    assert_eq!(session.token, jwt);
}

#[tokio::test]
async fn login_with_bad_credentials_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})))
        .mount(&server)
        .await;

    let api = ApiClient::new(&format!("{}/api", server.uri())).unwrap();
    let err = api.login("sam@gym.test", "wrong").await.unwrap_err();
    assert!(api_error(&err).map(ApiError::is_unauthorized).unwrap_or(false));
}

#[tokio::test]
async fn list_sends_bearer_and_page_params() {
    let server = MockServer::start().await;
    let jwt = token(json!({"sub": "1", "role": "ADMIN", "gymId": 3}));

    Mock::given(method("GET"))
        .and(path("/api/members/gym/3"))
        .and(header("authorization", format!("Bearer {}", jwt).as_str()))
        .and(query_param("page", "2"))
        .and(query_param("limit", "5"))
        .and(query_param("search", "ada"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": 12, "gymId": 3, "firstName": "Ada", "lastName": "Lovelace",
                "phone": "0712345678", "status": "ACTIVE"
            }],
            "total": 6, "page": 2, "limit": 5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, &jwt);
    let mut query = PageQuery::with_limit(5);
    query.set_search("ada");
    query.page = 2;

    let page = api.resource::<Member>().list(3, &query).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].full_name(), "Ada Lovelace");
    assert_eq!(page.items[0].status, MemberStatus::Active);
    assert_eq!(page.total_pages(), 2);
    assert!(!page.has_next());
    assert_eq!(page.range_label(), "6-6 of 6");
}

#[tokio::test]
async fn bare_array_lists_are_paged_locally() {
    let server = MockServer::start().await;
    let packages: Vec<_> = (1..=3)
        .map(|i| json!({"id": i, "gymId": 1, "name": format!("P{}", i), "durationDays": 30, "price": 10}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/packages/gym/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(packages))
        .mount(&server)
        .await;

    let api = client(&server, "t");
    let page = api
        .resource::<Package>()
        .list(1, &PageQuery::with_limit(2))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 3);
    assert!(page.has_next());
}

#[tokio::test]
async fn delete_accepts_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/members/12"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, "t");
    api.resource::<Member>().delete(12).await.unwrap();
}

#[tokio::test]
async fn error_bodies_map_to_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/members/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Member not found"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/members"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": ["email must be an email", "phone should not be empty"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/members/500"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let api = client(&server, "t");
    let members = api.resource::<Member>();

    let err = members.get(404).await.unwrap_err();
    match api_error(&err) {
        Some(ApiError::NotFound(msg)) => assert_eq!(msg, "Member not found"),
        other => panic!("unexpected: {:?}", other),
    }

    let err = api.post::<serde_json::Value, _>("members", &json!({})).await.unwrap_err();
    assert_eq!(
        api_error(&err).map(ApiError::user_message),
        Some("email must be an email; phone should not be empty".to_string())
    );

    let err = members.get(500).await.unwrap_err();
    assert!(matches!(api_error(&err), Some(ApiError::ServerError(_))));
}

#[tokio::test]
async fn malformed_json_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/members/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let api = client(&server, "t");
    let err = api.resource::<Member>().get(1).await.unwrap_err();
    assert!(matches!(api_error(&err), Some(ApiError::InvalidResponse(_))));
}
