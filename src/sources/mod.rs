pub mod binance;

pub use binance::BinanceKlineSource;
