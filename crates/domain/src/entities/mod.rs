pub mod position;
pub mod price_candle;
pub mod trading_pair;

// Re-export for easier access
pub use position::{Position, PositionId};
pub use price_candle::PriceCandle;
pub use trading_pair::TradingPair;
