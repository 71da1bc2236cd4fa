use crate::models::QuoteResult;

pub const BASE_PRICE: f64 = 1500.0;
pub const PRICE_PER_KG: f64 = 200.0;
pub const ESTIMATED_CARRIER: &str = "Estimado";
pub const DEFAULT_DELIVERY_ESTIMATE: &str = "2-5 días";

/// Local shipping price for a package of `weight_kg`.
///
/// Negative and non-finite weights price as an empty package.
pub fn estimate(weight_kg: f64) -> f64 {
    let weight = if weight_kg.is_finite() { weight_kg.max(0.0) } else { 0.0 };
    BASE_PRICE + weight * PRICE_PER_KG
}

pub fn fallback_quote(weight_kg: f64) -> QuoteResult {
    QuoteResult {
        price: estimate(weight_kg),
        estimated_time: DEFAULT_DELIVERY_ESTIMATE.to_string(),
        carrier: Some(ESTIMATED_CARRIER.to_string()),
    }
}
