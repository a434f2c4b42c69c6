//! Provider adapters implementing [`MarketDataSource`](crate::MarketDataSource).

pub mod polygon;

pub use polygon::PolygonAdapter;
