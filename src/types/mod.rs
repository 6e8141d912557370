pub mod candle;
pub mod signals;
pub mod trading;

pub use candle::*;
pub use signals::*;
pub use trading::*;
