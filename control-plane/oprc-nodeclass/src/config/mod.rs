mod types;

pub use types::NodeClassConfig;
