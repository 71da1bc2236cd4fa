//! Serverless functions that quote and create ZipNova shipments.
//!
//! Every function follows the same path: validate the inbound JSON, map it onto the
//! configured carrier contract, make one call to the carrier and fall back to a local
//! answer when that call does not produce one.

pub mod carrier;
pub mod config;
pub mod contract;
pub mod error;
pub mod estimate;
pub mod handler;
pub mod models;
pub mod notify;
pub mod quote;
pub mod shipment;
pub mod telemetry;
pub mod validate;

pub use carrier::{CarrierApi, UpstreamReply, ZipnovaClient};
pub use config::{Config, Origin};
pub use contract::ContractVersion;
pub use error::{ApiError, UpstreamError};
pub use handler::Route;
