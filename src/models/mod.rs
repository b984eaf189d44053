//! Data models
//!
//! Footprint inputs and results, and the stored calculation entity.

mod calculation;
mod consumption;
mod footprint;

pub use calculation::{is_valid_wallet_address, FootprintRecord, FootprintRecordCreate};
pub use consumption::{
    coerce_quantity, parse_key, sanitize_quantity, ConsumptionInput, QuantityMap, RawConsumption,
    MAX_QUANTITY,
};
pub use footprint::{CategoryBreakdown, FootprintResult};
