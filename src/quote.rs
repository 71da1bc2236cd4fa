use tracing::{info, warn};

use crate::carrier::CarrierApi;
use crate::config::Config;
use crate::error::UpstreamError;
use crate::estimate;
use crate::models::{QuoteRequest, QuoteResult};

/// Quote a validated request. Carrier failures are absorbed into the local estimate.
pub async fn quote(config: &Config, carrier: &dyn CarrierApi, request: &QuoteRequest) -> QuoteResult {
    info!(
        from = %format!("{} ({})", config.origin.city, config.origin.zip_code),
        to = %format!(
            "{} ({})",
            request.destination.city.as_deref().unwrap_or("N/A"),
            request.destination.postal_code
        ),
        weight_kg = request.package.weight_kg,
        "quote requested"
    );

    match carrier_rate(config, carrier, request).await {
        Ok(rate) => {
            info!(price = rate.price, carrier = ?rate.carrier, "carrier quote");
            rate
        }
        Err(error) => {
            let fallback = estimate::fallback_quote(request.package.weight_kg);
            warn!(%error, price = fallback.price, "carrier quote unavailable, using estimate");
            fallback
        }
    }
}

async fn carrier_rate(
    config: &Config,
    carrier: &dyn CarrierApi,
    request: &QuoteRequest,
) -> Result<QuoteResult, UpstreamError> {
    let contract = config.contract;
    let payload = contract.quote_payload(&config.origin, request);
    let reply = carrier
        .post(contract.quote_path(), &payload)
        .await?
        .into_success()?;
    contract.read_rate(&reply.body)
}
