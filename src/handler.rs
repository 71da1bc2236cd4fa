//! HTTP surface shared by every function: CORS, method screening, routing and rendering.

use anyhow::Context;
use http::{Method, Response, StatusCode, header};
use serde::Serialize;
use serde_json::Value;
use tracing::{Instrument, error, info_span, warn};
use uuid::Uuid;

use crate::carrier::{CarrierApi, ZipnovaClient};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::QuoteResponse;
use crate::{quote, shipment, validate};

pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "POST, OPTIONS"),
    ("access-control-allow-headers", "Content-Type"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Quote,
    CreateShipment,
}

impl Route {
    /// Route for the combined function, e.g. `/api/zipnova/quote`.
    pub fn from_path(path: &str) -> Option<Self> {
        if path.contains("/create-shipment") {
            Some(Self::CreateShipment)
        } else if path.contains("/quote") {
            Some(Self::Quote)
        } else {
            None
        }
    }
}

/// Entry point for the deployed functions: configuration and the carrier client are
/// resolved from the environment only once the request is known to need them.
pub async fn serve(
    route: Option<Route>,
    method: &Method,
    body: &[u8],
) -> Result<Response<String>, http::Error> {
    if let Some(response) = screen(method) {
        return response;
    }
    let Some(route) = route else {
        return render(&ApiError::NotFound);
    };

    let context = Config::from_env().and_then(|config| {
        let carrier = ZipnovaClient::new(&config)?;
        Ok((config, carrier))
    });

    match context {
        Ok((config, carrier)) => dispatch(route, body, &config, &carrier).await,
        Err(err) => {
            error!(error = %format!("{err:#}"), "function configuration failed");
            render(&ApiError::Internal(err))
        }
    }
}

/// Same as [`serve`] with explicit configuration and carrier.
pub async fn handle(
    route: Option<Route>,
    method: &Method,
    body: &[u8],
    config: &Config,
    carrier: &dyn CarrierApi,
) -> Result<Response<String>, http::Error> {
    if let Some(response) = screen(method) {
        return response;
    }
    match route {
        Some(route) => dispatch(route, body, config, carrier).await,
        None => render(&ApiError::NotFound),
    }
}

// Preflight and method checks; these answer on every path.
fn screen(method: &Method) -> Option<Result<Response<String>, http::Error>> {
    if method == Method::OPTIONS {
        return Some(respond(StatusCode::OK, String::new()));
    }
    if method != Method::POST {
        return Some(render(&ApiError::MethodNotAllowed));
    }
    None
}

async fn dispatch(
    route: Route,
    body: &[u8],
    config: &Config,
    carrier: &dyn CarrierApi,
) -> Result<Response<String>, http::Error> {
    let request_id = Uuid::new_v4();
    let span = info_span!("invocation", %request_id, ?route);

    async {
        match process(route, body, config, carrier).await {
            Ok(value) => respond(StatusCode::OK, value.to_string()),
            Err(err) => {
                if err.status().is_server_error() {
                    error!(error = %err, "request failed");
                } else {
                    warn!(error = %err, "request rejected");
                }
                render(&err)
            }
        }
    }
    .instrument(span)
    .await
}

async fn process(
    route: Route,
    body: &[u8],
    config: &Config,
    carrier: &dyn CarrierApi,
) -> Result<Value, ApiError> {
    let payload = parse_body(body)?;
    let value = match route {
        Route::Quote => {
            let request = validate::quote_request(&payload)?;
            let data = quote::quote(config, carrier, &request).await;
            encode(QuoteResponse {
                success: true,
                data,
            })?
        }
        Route::CreateShipment => {
            let order = validate::shipment_request(&payload)?;
            let result = shipment::create_shipment(config, carrier, &order).await;
            encode(result)?
        }
    };
    Ok(value)
}

// An empty body reads as `{}` so it fails validation rather than parsing.
fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(ApiError::MalformedBody)
}

fn encode<T: Serialize>(reply: T) -> Result<Value, ApiError> {
    serde_json::to_value(reply)
        .context("failed to encode response")
        .map_err(ApiError::from)
}

fn render(err: &ApiError) -> Result<Response<String>, http::Error> {
    respond(err.status(), err.body().to_string())
}

fn respond(status: StatusCode, body: String) -> Result<Response<String>, http::Error> {
    let mut builder = Response::builder().status(status);
    for (name, value) in CORS_HEADERS {
        builder = builder.header(name, value);
    }
    if !body.is_empty() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    builder.body(body)
}
