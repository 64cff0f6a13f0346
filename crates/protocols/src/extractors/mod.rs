//! One extractor per supported protocol.

pub mod aerodrome;
pub mod beefy;
pub mod cetus;
pub mod hyperion;
pub mod orca;
pub mod pancakeswap;
pub mod raydium;

pub use aerodrome::AerodromeExtractor;
pub use beefy::BeefyExtractor;
pub use cetus::CetusExtractor;
pub use hyperion::HyperionExtractor;
pub use orca::OrcaExtractor;
pub use pancakeswap::PancakeSwapExtractor;
pub use raydium::RaydiumExtractor;
