pub mod cache;
pub mod carbon_api;
pub mod intensity;
pub mod optimizer;
pub mod presets;
pub mod rate_limit;
