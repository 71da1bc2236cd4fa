//! Request validation and normalization.
//!
//! The storefront has posted destinations in more than one shape over time (English keys
//! with a single `address` line, Spanish keys with `calle`/`numero`). Both are accepted here
//! and normalized into [`Address`] before anything reaches the carrier contract.

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::models::{
    Address, Customer, DEFAULT_WEIGHT_KG, Dimensions, OrderItem, Package, QuoteRequest,
    ShipmentRequest,
};

pub const DESTINATION_ADDRESS: &str = "destination.address";
pub const DESTINATION_ZIP_CODE: &str = "destination.zipCode";
pub const CUSTOMER_NAME: &str = "customer.name";
pub const CUSTOMER_PHONE: &str = "customer.phone";
pub const CUSTOMER_EMAIL: &str = "customer.email";
pub const ITEMS: &str = "items";

pub const QUOTE_REQUIRED: &[&str] = &[DESTINATION_ADDRESS, DESTINATION_ZIP_CODE];
pub const SHIPMENT_REQUIRED: &[&str] = &[
    DESTINATION_ADDRESS,
    DESTINATION_ZIP_CODE,
    CUSTOMER_NAME,
    CUSTOMER_PHONE,
    CUSTOMER_EMAIL,
    ITEMS,
];

const STREET_KEYS: &[&str] = &["address", "street", "calle"];
const NUMBER_KEYS: &[&str] = &["number", "numero"];
const FLOOR_KEYS: &[&str] = &["floor", "unit", "piso"];
const CITY_KEYS: &[&str] = &["city", "ciudad"];
const PROVINCE_KEYS: &[&str] = &["province", "state", "provincia"];
const POSTAL_CODE_KEYS: &[&str] = &[
    "zipCode",
    "zipcode",
    "postalCode",
    "postal_code",
    "codigo_postal",
];

pub fn quote_request(body: &Value) -> Result<QuoteRequest, ApiError> {
    let mut missing = Vec::new();
    let destination = read_address(body.get("destination"), &mut missing);

    match destination {
        Some(destination) if missing.is_empty() => Ok(QuoteRequest {
            destination,
            package: read_package(body),
        }),
        _ => Err(ApiError::Validation {
            message: "Falta dirección de destino completa",
            required: QUOTE_REQUIRED,
            missing,
            invalid: Vec::new(),
        }),
    }
}

pub fn shipment_request(body: &Value) -> Result<ShipmentRequest, ApiError> {
    let mut missing = Vec::new();

    let destination = read_address(
        body.get("destination").or_else(|| body.get("address")),
        &mut missing,
    );

    let customer = body.get("customer").and_then(Value::as_object);
    let mut customer_field = |key: &str, label: &'static str| {
        let value = customer.and_then(|object| text(object, &[key]));
        if value.is_none() {
            missing.push(label);
        }
        value
    };
    let name = customer_field("name", CUSTOMER_NAME);
    let phone = customer_field("phone", CUSTOMER_PHONE);
    let email = customer_field("email", CUSTOMER_EMAIL);

    let mut invalid = Vec::new();
    let items = read_items(body.get("items"), &mut missing, &mut invalid);

    match (destination, name, phone, email, items) {
        (Some(destination), Some(name), Some(phone), Some(email), Some(items))
            if missing.is_empty() && invalid.is_empty() =>
        {
            let object = body.as_object();
            Ok(ShipmentRequest {
                customer: Customer { name, phone, email },
                destination,
                items,
                payment_method: object
                    .and_then(|o| text(o, &["payment", "paymentMethod", "payment_method"])),
                shipping_cost: number(body.get("shippingCost")),
            })
        }
        _ => Err(ApiError::Validation {
            message: "Faltan datos del pedido",
            required: SHIPMENT_REQUIRED,
            missing,
            invalid,
        }),
    }
}

fn read_address(value: Option<&Value>, missing: &mut Vec<&'static str>) -> Option<Address> {
    let object = value.and_then(Value::as_object);
    let street = object.and_then(|o| text(o, STREET_KEYS));
    let postal_code = object.and_then(|o| text(o, POSTAL_CODE_KEYS));

    if street.is_none() {
        missing.push(DESTINATION_ADDRESS);
    }
    if postal_code.is_none() {
        missing.push(DESTINATION_ZIP_CODE);
    }

    let (object, street, postal_code) = (object?, street?, postal_code?);
    Some(Address {
        street,
        number: text(object, NUMBER_KEYS),
        floor: text(object, FLOOR_KEYS),
        city: text(object, CITY_KEYS),
        province: text(object, PROVINCE_KEYS),
        postal_code,
    })
}

/// Weight comes from `package.weight`, then a top-level `weight`, then the item list.
fn read_package(body: &Value) -> Package {
    let package = body.get("package");

    let weight_kg = package
        .and_then(|p| number(p.get("weight")))
        .or_else(|| number(body.get("weight")))
        .or_else(|| items_weight(body.get("items")))
        .unwrap_or(DEFAULT_WEIGHT_KG);

    let defaults = Dimensions::default();
    let dimensions = package.map(|p| p.get("dimensions").unwrap_or(p));
    let side = |key: &str, default: f64| {
        dimensions
            .and_then(|d| number(d.get(key)))
            .filter(|value| *value > 0.0)
            .unwrap_or(default)
    };

    Package {
        weight_kg,
        dimensions: Dimensions {
            length: side("length", defaults.length),
            width: side("width", defaults.width),
            height: side("height", defaults.height),
        },
    }
}

/// Order lines, read one entry at a time. An absent or empty list is `missing`;
/// entries with an unusable field are reported as `invalid` by position.
fn read_items(
    value: Option<&Value>,
    missing: &mut Vec<&'static str>,
    invalid: &mut Vec<String>,
) -> Option<Vec<OrderItem>> {
    let Some(entries) = value.and_then(Value::as_array).filter(|e| !e.is_empty()) else {
        missing.push(ITEMS);
        return None;
    };

    let before = invalid.len();
    let mut items = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let Some(object) = entry.as_object() else {
            invalid.push(format!("items[{index}]"));
            continue;
        };
        let field = |key: &str| format!("items[{index}].{key}");

        let name = text(object, &["name"]);
        if name.is_none() {
            invalid.push(field("name"));
        }
        let quantity = match object.get("quantity") {
            None | Some(Value::Null) => Some(1),
            present => number(present)
                .filter(|q| q.fract() == 0.0 && *q >= 1.0 && *q <= f64::from(u32::MAX))
                .map(|q| q as u32),
        };
        if quantity.is_none() {
            invalid.push(field("quantity"));
        }
        let amount = |key: &str| match object.get(key) {
            None | Some(Value::Null) => Some(0.0),
            present => number(present),
        };
        let weight = amount("weight");
        let price = amount("price");
        if weight.is_none() {
            invalid.push(field("weight"));
        }
        if price.is_none() {
            invalid.push(field("price"));
        }

        if let (Some(name), Some(quantity), Some(weight), Some(price)) =
            (name, quantity, weight, price)
        {
            items.push(OrderItem {
                name,
                quantity,
                weight,
                price,
            });
        }
    }

    (invalid.len() == before).then_some(items)
}

fn items_weight(value: Option<&Value>) -> Option<f64> {
    let items = read_items(value, &mut Vec::new(), &mut Vec::new())?;
    let total: f64 = items.iter().map(OrderItem::total_weight).sum();
    (total > 0.0).then_some(total)
}

fn text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (parsed.is_finite() && parsed >= 0.0).then_some(parsed)
}
