//! Carrier request/response schemas.
//!
//! The storefront talked to ZipNova through several incompatible payload drafts. Only one
//! contract is authoritative at a time and it is picked by configuration; mapping is pure
//! data transformation with no I/O.
//!
//! ## V1
//! - quote: `POST {base}/shipments/quote`, reply `{ "rates": [{ price, estimated_delivery, carrier }] }`
//!   (a flat single-rate object is also accepted)
//! - shipment: `POST {base}/shipments`, reply `{ "tracking_number": "..." }`
//! - weights in kilograms, dimensions in centimetres, country always `AR`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::Origin;
use crate::error::UpstreamError;
use crate::estimate::DEFAULT_DELIVERY_ESTIMATE;
use crate::models::{Address, QuoteRequest, QuoteResult, ShipmentRequest};

const COUNTRY: &str = "AR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContractVersion {
    #[default]
    V1,
}

#[derive(Debug, Error)]
#[error("unknown carrier contract version `{0}`")]
pub struct UnknownContract(String);

impl FromStr for ContractVersion {
    type Err = UnknownContract;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            other => Err(UnknownContract(other.to_string())),
        }
    }
}

impl fmt::Display for ContractVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("v1"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct V1Party {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    address: String,
    city: Option<String>,
    state: Option<String>,
    postal_code: String,
    country: &'static str,
}

impl V1Party {
    fn origin(origin: &Origin, with_contact: bool) -> Self {
        Self {
            name: with_contact.then(|| origin.name.clone()),
            phone: with_contact.then(|| origin.phone.clone()),
            email: None,
            address: origin.address.clone(),
            city: Some(origin.city.clone()),
            state: Some(origin.province.clone()),
            postal_code: origin.zip_code.clone(),
            country: COUNTRY,
        }
    }

    fn destination(address: &Address) -> Self {
        Self {
            name: None,
            phone: None,
            email: None,
            address: address.line(),
            city: address.city.clone(),
            state: address.province.clone(),
            postal_code: address.postal_code.clone(),
            country: COUNTRY,
        }
    }
}

#[derive(Debug, Serialize)]
struct V1QuotePackage {
    weight: f64,
    length: f64,
    width: f64,
    height: f64,
}

#[derive(Debug, Serialize)]
struct V1Quote {
    origin: V1Party,
    destination: V1Party,
    package: V1QuotePackage,
}

#[derive(Debug, Serialize)]
struct V1ShipmentPackage {
    weight: f64,
    description: String,
    value: f64,
}

#[derive(Debug, Serialize)]
struct V1Shipment {
    origin: V1Party,
    destination: V1Party,
    package: V1ShipmentPackage,
    payment_method: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct V1Rate {
    price: Option<f64>,
    estimated_delivery: Option<String>,
    carrier: Option<String>,
}

#[derive(Debug, Deserialize)]
struct V1QuoteReply {
    #[serde(default)]
    rates: Option<Vec<V1Rate>>,
    #[serde(flatten)]
    single: V1Rate,
}

#[derive(Debug, Deserialize)]
struct V1ShipmentReply {
    tracking_number: Option<Value>,
}

impl ContractVersion {
    pub fn quote_path(self) -> &'static str {
        match self {
            Self::V1 => "/shipments/quote",
        }
    }

    pub fn shipment_path(self) -> &'static str {
        match self {
            Self::V1 => "/shipments",
        }
    }

    pub fn quote_payload(self, origin: &Origin, request: &QuoteRequest) -> Value {
        match self {
            Self::V1 => {
                let dimensions = request.package.dimensions;
                to_value(V1Quote {
                    origin: V1Party::origin(origin, false),
                    destination: V1Party::destination(&request.destination),
                    package: V1QuotePackage {
                        weight: request.package.weight_kg,
                        length: dimensions.length,
                        width: dimensions.width,
                        height: dimensions.height,
                    },
                })
            }
        }
    }

    pub fn shipment_payload(self, origin: &Origin, request: &ShipmentRequest) -> Value {
        match self {
            Self::V1 => {
                let customer = &request.customer;
                to_value(V1Shipment {
                    origin: V1Party::origin(origin, true),
                    destination: V1Party {
                        name: Some(customer.name.clone()),
                        phone: Some(customer.phone.clone()),
                        email: Some(customer.email.clone()),
                        ..V1Party::destination(&request.destination)
                    },
                    package: V1ShipmentPackage {
                        weight: request.total_weight(),
                        description: request.description(),
                        value: request.declared_value(),
                    },
                    payment_method: request.payment_method.clone(),
                })
            }
        }
    }

    /// First usable rate of a successful quote reply.
    pub fn read_rate(self, body: &str) -> Result<QuoteResult, UpstreamError> {
        match self {
            Self::V1 => {
                let reply: V1QuoteReply = serde_json::from_str(body)?;
                let rate = match reply.rates {
                    Some(rates) => rates.into_iter().next().unwrap_or_default(),
                    None => reply.single,
                };
                let price = rate
                    .price
                    .filter(|price| price.is_finite() && *price >= 0.0)
                    .ok_or(UpstreamError::NoRate)?;

                Ok(QuoteResult {
                    price,
                    estimated_time: rate
                        .estimated_delivery
                        .unwrap_or_else(|| DEFAULT_DELIVERY_ESTIMATE.to_string()),
                    carrier: rate.carrier,
                })
            }
        }
    }

    pub fn read_tracking(self, body: &str) -> Result<String, UpstreamError> {
        match self {
            Self::V1 => {
                let reply: V1ShipmentReply = serde_json::from_str(body)?;
                match reply.tracking_number {
                    Some(Value::String(code)) if !code.trim().is_empty() => Ok(code),
                    Some(Value::Number(code)) => Ok(code.to_string()),
                    _ => Err(UpstreamError::MissingTracking),
                }
            }
        }
    }
}

// String keys only, and non-finite floats serialize as null, so this never hits the fallback.
fn to_value<T: Serialize>(payload: T) -> Value {
    serde_json::to_value(payload).unwrap_or(Value::Null)
}
