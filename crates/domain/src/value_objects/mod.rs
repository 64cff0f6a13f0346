pub mod percentage;
pub mod price_bounds;

pub use percentage::Percentage;
pub use price_bounds::PriceBounds;
