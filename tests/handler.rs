use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use http::{Method, Response, StatusCode};
use regex::Regex;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use zipnova_shipping::handler::{CORS_HEADERS, handle};
use zipnova_shipping::{CarrierApi, Config, Route, UpstreamError, UpstreamReply, ZipnovaClient};

#[derive(Clone)]
enum Behaviour {
    Reply(u16, &'static str),
    Timeout,
}

#[derive(Clone)]
struct MockCarrier {
    behaviour: Behaviour,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockCarrier {
    fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn calls(&self) -> Result<Vec<(String, Value)>> {
        Ok(self
            .calls
            .lock()
            .map_err(|_| anyhow!("calls lock poisoned"))?
            .clone())
    }
}

#[async_trait::async_trait]
impl CarrierApi for MockCarrier {
    async fn post(&self, path: &str, payload: &Value) -> Result<UpstreamReply, UpstreamError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push((path.to_string(), payload.clone()));
        match self.behaviour {
            Behaviour::Reply(status, body) => Ok(UpstreamReply {
                status,
                body: body.to_string(),
            }),
            Behaviour::Timeout => Err(UpstreamError::Timeout(Duration::from_secs(7))),
        }
    }
}

fn json_body(response: &Response<String>) -> Value {
    serde_json::from_str(response.body()).expect("response body is JSON")
}

async fn post(route: Route, body: Value, config: &Config, carrier: &MockCarrier) -> Response<String> {
    handle(
        Some(route),
        &Method::POST,
        body.to_string().as_bytes(),
        config,
        carrier,
    )
    .await
    .expect("response builds")
}

fn quote_body() -> Value {
    json!({
        "destination": {
            "address": "Av. Colón 1234",
            "city": "Mar del Plata",
            "province": "Buenos Aires",
            "zipCode": "7600"
        },
        "package": { "weight": 4 }
    })
}

fn order_body() -> Value {
    json!({
        "customer": { "name": "Ana", "phone": "2235550000", "email": "ana@example.com" },
        "address": {
            "calle": "Av. Colón",
            "numero": "1234",
            "piso": "3B",
            "ciudad": "Mar del Plata",
            "provincia": "Buenos Aires",
            "codigo_postal": "7600"
        },
        "items": [
            { "name": "IPA", "quantity": 6, "weight": 0.5, "price": 1200 },
            { "name": "Stout", "quantity": 2, "weight": 0.75, "price": 1500 }
        ],
        "payment": "transferencia",
        "shippingCost": 2500
    })
}

fn assert_cors(response: &Response<String>) {
    for (name, value) in CORS_HEADERS {
        assert_eq!(response.headers()[name], value, "header {name}");
    }
}

#[tokio::test]
async fn options_is_allowed_on_every_path() {
    let config = Config::default();
    let carrier = MockCarrier::new(Behaviour::Timeout);

    for route in [None, Some(Route::Quote), Some(Route::CreateShipment)] {
        let response = handle(route, &Method::OPTIONS, b"", &config, &carrier)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body().is_empty());
        assert_cors(&response);
    }
    assert!(carrier.calls().unwrap().is_empty());
}

#[tokio::test]
async fn other_methods_are_rejected() {
    let config = Config::default();
    let carrier = MockCarrier::new(Behaviour::Timeout);

    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let response = handle(Some(Route::Quote), &method, b"", &config, &carrier)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(json_body(&response)["allowedMethods"], json!(["POST"]));
        assert_cors(&response);
    }
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let config = Config::default();
    let carrier = MockCarrier::new(Behaviour::Timeout);

    let response = handle(
        Route::from_path("/api/zipnova/track"),
        &Method::POST,
        b"{}",
        &config,
        &carrier,
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(&response)["error"], "Endpoint not found");
}

#[tokio::test]
async fn missing_destination_fields_are_listed() {
    let config = Config::default();
    let carrier = MockCarrier::new(Behaviour::Timeout);

    let cases = [
        (json!({}), json!(["destination.address", "destination.zipCode"])),
        (json!({ "destination": { "address": "Calle 7" } }), json!(["destination.zipCode"])),
        (json!({ "destination": { "zipCode": "1900" } }), json!(["destination.address"])),
    ];

    for (body, missing) in cases {
        let response = post(Route::Quote, body, &config, &carrier).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(&response);
        assert_eq!(body["missing"], missing);
        assert_eq!(body["required"], json!(["destination.address", "destination.zipCode"]));
        assert_cors(&response);
    }
    assert!(carrier.calls().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_body_is_an_internal_error() {
    let config = Config::default();
    let carrier = MockCarrier::new(Behaviour::Timeout);

    let response = handle(Some(Route::Quote), &Method::POST, b"{\"destination\":", &config, &carrier)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(&response);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn carrier_rate_is_surfaced_verbatim() {
    let config = Config::default();
    let carrier = MockCarrier::new(Behaviour::Reply(
        200,
        r#"{"rates":[
            {"price":3871.25,"estimated_delivery":"3-4 días hábiles","carrier":"Andreani"},
            {"price":3100,"estimated_delivery":"5-7 días","carrier":"OCA"}
        ]}"#,
    ));

    let response = post(Route::Quote, quote_body(), &config, &carrier).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);

    let body = json_body(&response);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["price"].as_f64(), Some(3871.25));
    assert_eq!(body["data"]["estimatedTime"], "3-4 días hábiles");
    assert_eq!(body["data"]["carrier"], "Andreani");

    let calls = carrier.calls().unwrap();
    assert_eq!(calls.len(), 1);
    let (path, payload) = &calls[0];
    assert_eq!(path, "/shipments/quote");
    assert_eq!(payload["origin"]["postal_code"], "1900");
    assert_eq!(payload["destination"]["address"], "Av. Colón 1234");
    assert_eq!(payload["destination"]["postal_code"], "7600");
    assert_eq!(payload["destination"]["country"], "AR");
    assert_eq!(payload["package"]["weight"].as_f64(), Some(4.0));
}

#[tokio::test]
async fn carrier_failures_fall_back_to_estimate() {
    let config = Config::default();
    let failures = [
        Behaviour::Timeout,
        Behaviour::Reply(500, r#"{"error":"internal"}"#),
        Behaviour::Reply(401, "Unauthorized"),
        Behaviour::Reply(200, "<html>gateway</html>"),
        Behaviour::Reply(200, r#"{"rates":[]}"#),
    ];

    for behaviour in failures {
        let carrier = MockCarrier::new(behaviour);
        let response = post(Route::Quote, quote_body(), &config, &carrier).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(&response);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["carrier"], "Estimado");
        assert_eq!(body["data"]["price"].as_f64(), Some(1500.0 + 4.0 * 200.0));
        assert_eq!(body["data"]["estimatedTime"], "2-5 días");
        assert_eq!(carrier.calls().unwrap().len(), 1, "exactly one carrier call");
    }
}

#[tokio::test]
async fn unreachable_carrier_falls_back_to_estimate() {
    let config = Config {
        api_url: "http://127.0.0.1:9/v1".to_string(),
        timeout: Duration::from_secs(2),
        ..Config::default()
    };
    let carrier = ZipnovaClient::new(&config).unwrap();
    let body = json!({ "destination": { "address": "Calle 7 123", "zipCode": "1900" } });

    let response = handle(
        Some(Route::Quote),
        &Method::POST,
        body.to_string().as_bytes(),
        &config,
        &carrier,
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(&response);
    assert_eq!(body["data"]["carrier"], "Estimado");
    assert_eq!(body["data"]["price"].as_f64(), Some(2500.0));
}

#[tokio::test]
async fn stalled_carrier_body_falls_back_within_timeout() {
    // Headers arrive promptly; the body never finishes.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; 4096];
        let _ = socket.read(&mut request).await;
        let _ = socket
            .write_all(
                b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"rates\":",
            )
            .await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    });

    let config = Config {
        api_url: format!("http://{addr}/v1"),
        timeout: Duration::from_secs(1),
        ..Config::default()
    };
    let carrier = ZipnovaClient::new(&config).unwrap();

    let response = tokio::time::timeout(
        Duration::from_secs(6),
        handle(
            Some(Route::Quote),
            &Method::POST,
            quote_body().to_string().as_bytes(),
            &config,
            &carrier,
        ),
    )
    .await
    .expect("handler answers within the carrier timeout")
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(&response);
    assert_eq!(body["data"]["carrier"], "Estimado");
    assert_eq!(body["data"]["price"].as_f64(), Some(1500.0 + 4.0 * 200.0));
}

#[tokio::test]
async fn shipment_validation_reports_invalid_items() {
    let config = Config::default();
    let carrier = MockCarrier::new(Behaviour::Timeout);

    let mut body = order_body();
    body["items"][1]["quantity"] = json!("dos");

    let response = post(Route::CreateShipment, body, &config, &carrier).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(&response);
    assert_eq!(body["missing"], json!([]));
    assert_eq!(body["invalid"], json!(["items[1].quantity"]));
    assert!(carrier.calls().unwrap().is_empty());
}

#[tokio::test]
async fn shipment_validation_lists_missing_fields() {
    let config = Config::default();
    let carrier = MockCarrier::new(Behaviour::Timeout);

    let response = post(
        Route::CreateShipment,
        json!({
            "customer": { "name": "Ana" },
            "address": { "calle": "Calle 7", "codigo_postal": "1900" },
            "items": []
        }),
        &config,
        &carrier,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(&response)["missing"],
        json!(["customer.phone", "customer.email", "items"])
    );
    assert!(carrier.calls().unwrap().is_empty());
}

#[tokio::test]
async fn shipment_returns_carrier_tracking() {
    let config = Config::default();
    let carrier = MockCarrier::new(Behaviour::Reply(201, r#"{"tracking_number":"AND-00042"}"#));

    let response = post(Route::CreateShipment, order_body(), &config, &carrier).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(&response);
    assert_eq!(body["success"], true);
    assert_eq!(body["trackingNumber"], "AND-00042");
    assert_eq!(body["message"], "Envío creado exitosamente");
    assert!(body.get("whatsappUrl").is_none());

    let calls = carrier.calls().unwrap();
    let (path, payload) = &calls[0];
    assert_eq!(path, "/shipments");
    assert_eq!(payload["destination"]["address"], "Av. Colón 1234 3B");
    assert_eq!(payload["destination"]["email"], "ana@example.com");
    assert_eq!(payload["package"]["weight"].as_f64(), Some(4.5));
    assert_eq!(payload["package"]["value"].as_f64(), Some(10200.0));
    assert_eq!(payload["package"]["description"], "IPA x6, Stout x2");
    assert_eq!(payload["payment_method"], "transferencia");
}

#[tokio::test]
async fn shipment_failure_synthesizes_tracking() {
    let pattern = Regex::new(r"^ZN-\d+$").unwrap();
    let config = Config {
        whatsapp_number: Some("+54 9 221 555-0000".to_string()),
        ..Config::default()
    };

    for behaviour in [
        Behaviour::Timeout,
        Behaviour::Reply(503, "Service Unavailable"),
        Behaviour::Reply(200, r#"{"error":"Invalid JSON response"}"#),
    ] {
        let carrier = MockCarrier::new(behaviour);
        let response = post(Route::CreateShipment, order_body(), &config, &carrier).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(&response);
        assert_eq!(body["success"], true);
        let tracking = body["trackingNumber"].as_str().unwrap();
        assert!(pattern.is_match(tracking), "{tracking}");

        let link = body["whatsappUrl"].as_str().unwrap();
        assert!(link.starts_with("https://wa.me/5492215550000?text="));
        assert!(link.contains(tracking));
    }
}
