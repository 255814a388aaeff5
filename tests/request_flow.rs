mod common;

use liveclass_api::{
    ApiClient, Config, ErrorKind, Interceptors, MultipartPart, RequestBody, RequestOptions,
    ResponseEnvelope, TokenPair,
};
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_json, header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use common::{client, test_config};

#[tokio::test]
async fn json_body_round_trips_through_normalizer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/forums/12/posts/"))
        .and(header("content-type", "application/json"))
        .respond_with(|req: &Request| {
            ResponseTemplate::new(201).set_body_raw(req.body.clone(), "application/json")
        })
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    client.tokens().set_tokens(&TokenPair::new("A1", "R1")).await;

    let original = json!({
        "title": "Week 3 recap",
        "tags": ["algebra", "live"],
        "meta": {"pinned": false, "score": 4.5, "attachments": null}
    });
    let envelope = client
        .post(
            "/forums/12/posts/",
            RequestBody::json(&original).unwrap(),
            RequestOptions::default(),
        )
        .await
        .expect("echo succeeds");

    assert!(envelope.success);
    assert_eq!(envelope.status, 201);
    assert_eq!(envelope.status_text, "Created");
    assert_eq!(envelope.data, Some(original));
}

#[tokio::test]
async fn no_content_response_has_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/notes/9/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    client.tokens().set_tokens(&TokenPair::new("A1", "R1")).await;

    let envelope = client
        .delete("/notes/9/", RequestOptions::default())
        .await
        .expect("delete succeeds");
    assert!(envelope.success);
    assert_eq!(envelope.status, 204);
    assert_eq!(envelope.data, None);
}

#[tokio::test]
async fn multipart_upload_lets_transport_set_boundary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/batches/3/materials/"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 77})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    client.tokens().set_tokens(&TokenPair::new("A1", "R1")).await;

    let body = RequestBody::Multipart(vec![
        MultipartPart::text("title", "Lecture slides"),
        MultipartPart::file("file", "slides.pdf", b"%PDF-1.4".to_vec()).with_mime("application/pdf"),
    ]);
    let envelope = client
        .post(
            "/batches/3/materials/",
            body,
            RequestOptions::default().header("Content-Type", "application/json"),
        )
        .await
        .expect("upload succeeds");
    assert_eq!(envelope.data, Some(json!({"id": 77})));
}

#[tokio::test]
async fn query_and_custom_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sessions/"))
        .and(query_param("status", "live now"))
        .and(header("X-Client", "dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    client.tokens().set_tokens(&TokenPair::new("A1", "R1")).await;

    client
        .get(
            "/sessions/",
            RequestOptions::default()
                .query("status", "live now")
                .header("X-Client", "dashboard"),
        )
        .await
        .expect("filtered list");
}

#[tokio::test]
async fn login_stores_returned_pair() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .and(body_json(json!({"email": "teacher@example.com", "password": "s3cret"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "A1", "refresh": "R1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, backend) = client(&server);
    let pair = client
        .login(&json!({"email": "teacher@example.com", "password": "s3cret"}))
        .await
        .expect("login succeeds");

    assert_eq!(pair, TokenPair::new("A1", "R1"));
    assert_eq!(common::raw(&backend, "token").as_deref(), Some("A1"));
    assert_eq!(common::raw(&backend, "refreshToken").as_deref(), Some("R1"));

    client.logout().await;
    assert_eq!(common::raw(&backend, "access_token"), None);
}

#[tokio::test]
async fn file_backed_tokens_survive_a_new_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile/"))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Ada"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().expect("temp dir");
    let token_file = dir.path().join("tokens.json");
    let config = test_config(&server).with_token_file(&token_file);

    let first = ApiClient::from_config(&config).expect("client");
    first.tokens().set_tokens(&TokenPair::new("A1", "R1")).await;
    drop(first);

    let second = ApiClient::from_config(&config).expect("client");
    let envelope = second
        .get("/profile/", RequestOptions::default())
        .await
        .expect("persisted token used");
    assert_eq!(envelope.data, Some(json!({"name": "Ada"})));
}

#[tokio::test]
async fn interceptors_transform_requests_and_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/badges/404/"))
        .and(header("Accept-Language", "fr"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let client = client.with_interceptors(
        Interceptors::new()
            .on_request(|mut d| {
                d.headers.push(("Accept-Language".into(), "fr".into()));
                d
            })
            .on_error(|mut e| {
                e.user_message = format!("badges: {}", e.user_message);
                e
            }),
    );
    client.tokens().set_tokens(&TokenPair::new("A1", "R1")).await;

    let result = client.get("/badges/404/", RequestOptions::default()).await;
    let envelope = ResponseEnvelope::from_result(result);

    assert!(!envelope.success);
    assert_eq!(envelope.status, 404);
    let error = envelope.error.expect("error attached");
    assert_eq!(error.kind, ErrorKind::NotFound);
    assert_eq!(error.user_message, "badges: The requested resource was not found.");
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = Config::new(format!("http://127.0.0.1:{port}"))
        .with_retry(2, std::time::Duration::from_millis(10));

    let client = ApiClient::from_config(&config).expect("client");
    client.tokens().set_tokens(&TokenPair::new("A1", "R1")).await;
    let err = client
        .get("/batches/", RequestOptions::default())
        .await
        .expect_err("nothing listening");
    assert_eq!(err.kind(), Some(ErrorKind::Network));
}

#[test]
fn invalid_base_url_fails_fast() {
    let err = match ApiClient::from_config(&Config::new("http://bad host")) {
        Ok(_) => panic!("expected invalid URL error"),
        Err(err) => err,
    };
    match err {
        liveclass_api::Error::Config(msg) => assert!(msg.contains("Invalid base URL")),
        other => panic!("unexpected error: {:?}", other),
    }
}
