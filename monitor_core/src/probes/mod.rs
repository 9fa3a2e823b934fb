pub mod database;
pub mod http;
pub mod registry;
pub mod strategy;


pub use database::DatabaseProbe;
pub use http::HttpProbe;
pub use registry::StrategyRegistry;
pub use strategy::ProbeStrategy;
