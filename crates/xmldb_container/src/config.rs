//! Container configuration.

/// Configuration for opening a container.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Open without the write lock; all writes fail.
    pub read_only: bool,

    /// Whether `open_container` may create a missing container.
    pub create_if_missing: bool,

    /// Whether to persist the snapshot after every write (safer but slower).
    ///
    /// When false, writes are persisted by `Container::flush` and when the
    /// last handle to the container is dropped.
    pub sync_on_write: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            read_only: false,
            create_if_missing: false,
            sync_on_write: true,
        }
    }
}

impl ContainerConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets read-only mode.
    #[must_use]
    pub const fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }

    /// Sets whether to create the container if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to persist after every write.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ContainerConfig::default();
        assert!(!config.read_only);
        assert!(!config.create_if_missing);
        assert!(config.sync_on_write);
    }

    #[test]
    fn builder_pattern() {
        let config = ContainerConfig::new()
            .read_only(true)
            .create_if_missing(true)
            .sync_on_write(false);

        assert!(config.read_only);
        assert!(config.create_if_missing);
        assert!(!config.sync_on_write);
    }
}
