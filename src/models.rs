use serde::{Deserialize, Serialize};

pub const DEFAULT_WEIGHT_KG: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub street: String,
    pub number: Option<String>,
    pub floor: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: String,
}

impl Address {
    /// Single-line street address, e.g. "Calle 7 1234 3B".
    pub fn line(&self) -> String {
        [Some(self.street.as_str()), self.number.as_deref(), self.floor.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            length: 40.0,
            width: 30.0,
            height: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Package {
    pub weight_kg: f64,
    pub dimensions: Dimensions,
}

impl Default for Package {
    fn default() -> Self {
        Self {
            weight_kg: DEFAULT_WEIGHT_KG,
            dimensions: Dimensions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub destination: Address,
    pub package: Package,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// One order line. Built by the validator; quantity defaults to 1, weight and price to 0.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    /// Unit weight in kilograms.
    pub weight: f64,
    /// Unit price.
    pub price: f64,
}

impl OrderItem {
    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    pub fn total_weight(&self) -> f64 {
        self.weight * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentRequest {
    pub customer: Customer,
    pub destination: Address,
    pub items: Vec<OrderItem>,
    pub payment_method: Option<String>,
    pub shipping_cost: Option<f64>,
}

impl ShipmentRequest {
    pub fn declared_value(&self) -> f64 {
        self.items.iter().map(OrderItem::subtotal).sum()
    }

    pub fn total_weight(&self) -> f64 {
        self.items.iter().map(OrderItem::total_weight).sum()
    }

    pub fn description(&self) -> String {
        self.items
            .iter()
            .map(|item| format!("{} x{}", item.name, item.quantity))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResult {
    pub price: f64,
    pub estimated_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub success: bool,
    pub data: QuoteResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentResult {
    pub success: bool,
    pub tracking_number: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_url: Option<String>,
}
