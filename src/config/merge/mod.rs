//! Config composition.

pub mod service;

pub(crate) mod merge_policy {
    use config::builder::DefaultState;
    use config::{ConfigBuilder, ConfigError};

    /// Builder seeded with the values every later source may override.
    pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("store.backend", "local")?
            .set_default("ops.list_limit", 1000_i64)?
            .set_default("ops.transfer_concurrency", 8_i64)
    }
}
