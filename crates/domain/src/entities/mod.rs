pub mod capture;
pub mod position;
pub mod record;
pub mod snapshot;

pub use capture::Capture;
pub use position::Position;
pub use record::PositionRecord;
pub use snapshot::{PortfolioSummary, Snapshot};
