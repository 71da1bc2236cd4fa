use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::carrier::CarrierApi;
use crate::config::Config;
use crate::error::UpstreamError;
use crate::models::{ShipmentRequest, ShipmentResult};
use crate::notify;

pub const CREATED_MESSAGE: &str = "Envío creado exitosamente";

/// Tracking code used when the carrier does not issue one: `ZN-<epoch millis>`.
pub fn local_tracking_number(now: DateTime<Utc>) -> String {
    format!("ZN-{}", now.timestamp_millis())
}

/// Submit an order. Always succeeds; carrier failures get a locally generated tracking code.
pub async fn create_shipment(
    config: &Config,
    carrier: &dyn CarrierApi,
    order: &ShipmentRequest,
) -> ShipmentResult {
    info!(
        customer = %order.customer.name,
        zip_code = %order.destination.postal_code,
        items = order.items.len(),
        declared_value = order.declared_value(),
        "shipment requested"
    );

    let tracking_number = match carrier_tracking(config, carrier, order).await {
        Ok(code) => {
            info!(tracking_number = %code, "carrier shipment created");
            code
        }
        Err(error) => {
            let code = local_tracking_number(Utc::now());
            warn!(%error, tracking_number = %code, "carrier shipment failed, using local tracking code");
            code
        }
    };

    let whatsapp_url = config.whatsapp_number.as_deref().and_then(|number| {
        notify::whatsapp_link(number, &notify::order_message(order, &tracking_number))
    });

    ShipmentResult {
        success: true,
        tracking_number,
        message: CREATED_MESSAGE.to_string(),
        whatsapp_url,
    }
}

async fn carrier_tracking(
    config: &Config,
    carrier: &dyn CarrierApi,
    order: &ShipmentRequest,
) -> Result<String, UpstreamError> {
    let contract = config.contract;
    let payload = contract.shipment_payload(&config.origin, order);
    let reply = carrier
        .post(contract.shipment_path(), &payload)
        .await?
        .into_success()?;
    contract.read_tracking(&reply.body)
}
