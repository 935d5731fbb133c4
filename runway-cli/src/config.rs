//! Configuration module

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the Runway API
    pub api_url: String,

    /// Namespace scripts are looked up in
    pub namespace: String,
}
