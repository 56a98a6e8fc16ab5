//! Infrastructure services

mod gateway;

pub use gateway::{DEGRADED_HANDLER_ID, DEGRADED_MESSAGE, GatewayService, SystemStatus};
