// Core trading domain entities and value objects
pub mod exchange;
pub mod gbce;
pub mod stock;
pub mod types;

pub use exchange::Exchange;
pub use stock::{CommonStock, PreferredStock, Stock, StockKind, StockListing};
pub use types::{Trade, TradeType};
