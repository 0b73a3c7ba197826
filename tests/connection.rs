use skyflow::{
    ConnectionConfig, Credentials, InvokeConnectionRequest, Method, Skyflow, SkyflowError,
};
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> Skyflow {
    Skyflow::builder()
        .connection(ConnectionConfig::new(
            "conn1",
            format!("{}/gateway/cards/{{card_id}}/pay", server.uri()),
        ))
        .credentials(Credentials::api_key("sky-test-key"))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_invoke_connection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gateway/cards/c-42/pay"))
        .and(query_param("currency", "EUR"))
        .and(header("x-skyflow-authorization", "sky-test-key"))
        .and(header("x-merchant", "m-1"))
        .and(body_json(serde_json::json!({"amount": 10})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-request-id", "req-conn")
                .set_body_json(serde_json::json!({"status": "paid"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut request = InvokeConnectionRequest::default();
    request.path_params.insert("card_id".into(), "c-42".into());
    request.query_params.insert("currency".into(), "EUR".into());
    request.headers.insert("x-merchant".into(), "m-1".into());
    request.body = Some(serde_json::json!({"amount": 10}));

    let response = client(&server)
        .connection("conn1")
        .unwrap()
        .invoke(&request)
        .await
        .unwrap();

    assert_eq!(response.data, serde_json::json!({"status": "paid"}));
    assert_eq!(response.request_id.as_deref(), Some("req-conn"));
}

#[tokio::test]
async fn test_invoke_connection_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("x-request-id", "req-404")
                .set_body_json(serde_json::json!({"error": {"message": "no such card"}})),
        )
        .mount(&server)
        .await;

    let mut request = InvokeConnectionRequest {
        method: Method::GET,
        ..InvokeConnectionRequest::default()
    };
    request.path_params.insert("card_id".into(), "c-1".into());

    let err = client(&server)
        .default_connection()
        .unwrap()
        .invoke(&request)
        .await
        .unwrap_err();

    assert_eq!(err.code(), 404);
    assert_eq!(err.request_id(), Some("req-404"));
}

#[tokio::test]
async fn test_missing_path_param_makes_no_call() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .default_connection()
        .unwrap()
        .invoke(&InvokeConnectionRequest::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SkyflowError::Validation(_)));
}
