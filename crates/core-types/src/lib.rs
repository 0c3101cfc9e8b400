pub mod enums;
pub mod error;
pub mod log;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::Direction;
pub use error::CoreError;
pub use log::TradeLog;
pub use structs::Trade;
