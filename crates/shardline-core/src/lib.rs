pub mod boundary;
pub mod config;
pub mod unit;

pub use boundary::{DiscoveredUnit, MeasurementBatch};
pub use config::ShardlineConfig;
pub use unit::{Unit, UnitId, ID_SEPARATOR};
