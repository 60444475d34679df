//! Domain types for crowding inference.
//!
//! Codes are validated at construction time so code that receives them can
//! trust their validity.

mod arrival;
mod code;
mod crowding;
mod reading;

pub use arrival::ArrivalRecord;
pub use code::{InvalidCode, LineCode, StationCode};
pub use crowding::{CrowdingContext, CrowdingLevel};
pub use reading::{FlowReading, NewFlowReading};
