//! Market data models
//!
//! - `symbol` - Normalized trading pair used as the cache key (Symbol)
//! - `ticker` - Immutable live quote (TickerSnapshot)
//! - `candle` - Historical bars (Candle, CandleSeries)
//! - `timeframe` - Supported candle intervals (Timeframe)

mod candle;
mod symbol;
mod ticker;
mod timeframe;

pub use candle::{Candle, CandleSeries};
pub use symbol::Symbol;
pub use ticker::TickerSnapshot;
pub use timeframe::Timeframe;
