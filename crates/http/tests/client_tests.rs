//! Integration tests for the Cutline HTTP client

use cutline_core::{MemoryNavigator, Navigator, Route, SessionEvent, SessionEvents, TokenStore};
use cutline_http::client::ClientError;
use cutline_http::{ApiClient, Credentials, ListQuery, Page, Resource};
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

struct NoAuthorization;

impl Match for NoAuthorization {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

struct Harness {
    server: MockServer,
    store: TokenStore,
    navigator: Arc<MemoryNavigator>,
    events: SessionEvents,
    client: ApiClient,
}

async fn harness(coalesce: bool) -> Harness {
    let server = MockServer::start().await;
    let store = TokenStore::in_memory();
    let navigator = Arc::new(MemoryNavigator::new(Route::Path("/products".into())));
    let events = SessionEvents::new();
    let client = ApiClient::builder()
        .base_url(format!("{}/", server.uri()))
        .store(store.clone())
        .navigator(navigator.clone())
        .events(events.clone())
        .coalesce_refresh(coalesce)
        .build()
        .unwrap();

    Harness {
        server,
        store,
        navigator,
        events,
        client,
    }
}

#[tokio::test]
async fn test_client_builder_requires_base_url() {
    let result = ApiClient::builder().build();
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[tokio::test]
async fn test_builder_trims_trailing_slash() {
    let client = ApiClient::builder()
        .base_url("http://localhost:8000/api/")
        .build()
        .unwrap();
    assert_eq!(client.base_url(), "http://localhost:8000/api");
}

#[tokio::test]
async fn test_bearer_attached_when_token_stored() {
    let h = harness(false).await;
    h.store.set_tokens("abc", None).unwrap();

    Mock::given(method("GET"))
        .and(path("/products/"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&h.server)
        .await;

    let page: Page<Value> = h.client.list(Resource::Products, &ListQuery::new()).await.unwrap();
    assert!(page.results.is_empty());
}

#[tokio::test]
async fn test_no_token_sends_unauthenticated() {
    let h = harness(false).await;

    Mock::given(method("GET"))
        .and(path("/categories/"))
        .and(NoAuthorization)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 0, "results": []})))
        .expect(1)
        .mount(&h.server)
        .await;

    let page: Page<Value> = h
        .client
        .list(Resource::Categories, &ListQuery::new())
        .await
        .unwrap();
    assert_eq!(page.count, 0);
}

#[tokio::test]
async fn test_refresh_then_retry_succeeds() {
    let h = harness(false).await;
    h.store.set_tokens("old", Some("r1")).unwrap();

    Mock::given(method("GET"))
        .and(path("/users/profile/"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/profile/"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "username": "ana"})))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/refresh/"))
        .and(body_json(json!({"refresh": "r1"})))
        .and(NoAuthorization)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let profile = h.client.profile().await.unwrap();

    assert_eq!(profile.username, "ana");
    assert_eq!(h.store.access_token().as_deref(), Some("new"));
    assert_eq!(h.store.refresh_token().as_deref(), Some("r1"));
    assert_eq!(h.navigator.current(), Route::Path("/products".into()));
}

#[tokio::test]
async fn test_second_401_is_not_refreshed_again() {
    let h = harness(false).await;
    h.store.set_tokens("old", Some("r1")).unwrap();

    Mock::given(method("GET"))
        .and(path("/products/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("nope"))
        .expect(2)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let result: Result<Page<Value>, _> = h.client.list(Resource::Products, &ListQuery::new()).await;

    assert!(matches!(result, Err(ClientError::AuthenticationFailed(ref m)) if m == "nope"));
    assert_eq!(h.store.access_token().as_deref(), Some("new"));
}

#[tokio::test]
async fn test_missing_refresh_token_ends_session() {
    let h = harness(false).await;
    h.store.set_tokens("old", None).unwrap();
    let mut events = h.events.subscribe();

    Mock::given(method("GET"))
        .and(path("/types/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
        .expect(0)
        .mount(&h.server)
        .await;

    let result: Result<Page<Value>, _> = h.client.list(Resource::Types, &ListQuery::new()).await;

    assert!(matches!(result, Err(ClientError::AuthenticationFailed(ref m)) if m == "expired"));
    assert_eq!(h.store.access_token(), None);
    assert_eq!(h.navigator.current(), Route::Login);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Ended);
}

#[tokio::test]
async fn test_refresh_failure_surfaces_refresh_error() {
    let h = harness(false).await;
    h.store.set_tokens("old", Some("revoked")).unwrap();
    let mut events = h.events.subscribe();

    Mock::given(method("GET"))
        .and(path("/subproducts/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/refresh/"))
        .respond_with(ResponseTemplate::new(400).set_body_string("token_not_valid"))
        .expect(1)
        .mount(&h.server)
        .await;

    let result: Result<Page<Value>, _> = h
        .client
        .list(Resource::Subproducts, &ListQuery::new())
        .await;

    assert!(matches!(result, Err(ClientError::BadRequest(ref m)) if m == "token_not_valid"));
    assert_eq!(h.store.access_token(), None);
    assert_eq!(h.store.refresh_token(), None);
    assert_eq!(h.navigator.current(), Route::Login);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Ended);
}

#[tokio::test]
async fn test_rotated_refresh_token_is_stored() {
    let h = harness(false).await;
    h.store.set_tokens("old", Some("r1")).unwrap();

    Mock::given(method("GET"))
        .and(path("/users/profile/"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/profile/"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"username": "ana"})))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/refresh/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "new", "refresh": "r2"})),
        )
        .mount(&h.server)
        .await;

    h.client.profile().await.unwrap();
    assert_eq!(h.store.refresh_token().as_deref(), Some("r2"));
}

#[tokio::test]
async fn test_other_errors_pass_through() {
    let h = harness(false).await;
    h.store.set_tokens("abc", Some("r1")).unwrap();

    Mock::given(method("GET"))
        .and(path("/products/99/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found."))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
        .expect(0)
        .mount(&h.server)
        .await;

    let result: Result<Value, _> = h.client.fetch(Resource::Products, "99").await;
    assert!(matches!(result, Err(ClientError::NotFound(_))));
    assert_eq!(h.store.access_token().as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_failed_login_does_not_refresh_or_redirect() {
    let h = harness(false).await;
    h.store.set_tokens("kept", Some("kept-refresh")).unwrap();

    Mock::given(method("POST"))
        .and(path("/users/login/"))
        .and(NoAuthorization)
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
        .expect(0)
        .mount(&h.server)
        .await;

    let result = h.client.login(&Credentials::new("ana", "wrong")).await;

    assert!(matches!(result, Err(ClientError::AuthenticationFailed(_))));
    assert_eq!(h.store.access_token().as_deref(), Some("kept"));
    assert_eq!(h.navigator.history().len(), 1);
}

#[tokio::test]
async fn test_list_sends_query_string() {
    let h = harness(false).await;

    Mock::given(method("GET"))
        .and(path("/cutting-orders/"))
        .and(query_param("page", "2"))
        .and(query_param("status", "pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 11,
            "next": null,
            "previous": "http://x/cutting-orders/?page=1",
            "results": [{"id": 11}]
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let query = ListQuery::new().page(2).filter("status", "pending");
    let page: Page<Value> = h.client.list(Resource::CuttingOrders, &query).await.unwrap();

    assert_eq!(page.count, 11);
    assert_eq!(page.results, vec![json!({"id": 11})]);
}

#[tokio::test]
async fn test_create_update_remove() {
    let h = harness(false).await;

    Mock::given(method("POST"))
        .and(path("/categories/"))
        .and(body_json(json!({"name": "Steel"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 3, "name": "Steel"})))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/categories/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3, "name": "Iron"})))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/categories/3/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;

    let created: Value = h
        .client
        .create(Resource::Categories, &json!({"name": "Steel"}))
        .await
        .unwrap();
    assert_eq!(created["id"], 3);

    let updated: Value = h
        .client
        .update(Resource::Categories, "3", &json!({"name": "Iron"}))
        .await
        .unwrap();
    assert_eq!(updated["name"], "Iron");

    h.client.remove(Resource::Categories, "3").await.unwrap();
}

#[tokio::test]
async fn test_coalesced_refresh_runs_once_for_concurrent_401s() {
    let h = harness(true).await;
    h.store.set_tokens("old", Some("r1")).unwrap();

    Mock::given(method("GET"))
        .and(path("/products/"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let query = ListQuery::new();
    let (a, b) = tokio::join!(
        h.client.list::<Value>(Resource::Products, &query),
        h.client.list::<Value>(Resource::Products, &query),
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(h.store.access_token().as_deref(), Some("new"));
}

#[tokio::test]
async fn test_logout_posts_refresh_token() {
    let h = harness(false).await;
    h.store.set_tokens("abc", Some("r1")).unwrap();

    Mock::given(method("POST"))
        .and(path("/users/logout/"))
        .and(header("authorization", "Bearer abc"))
        .and(body_json(json!({"refresh_token": "r1"})))
        .respond_with(ResponseTemplate::new(205))
        .expect(1)
        .mount(&h.server)
        .await;

    h.client.logout(Some("r1")).await.unwrap();
}
