//! Parser configuration types.

/// Default unread bytes per part before it reports congestion.
pub const DEFAULT_HIGH_WATER_MARK: usize = 16 * 1024;

/// Default maximum size of a single header block.
pub const DEFAULT_MAX_HEADER_SIZE: usize = 8 * 1024;

/// Default maximum number of nested multipart containers.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Limits and thresholds of a [`MultipartParser`](crate::MultipartParser).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Unread bytes at which a part reports congestion.
    pub high_water_mark: usize,
    /// Largest header block accepted, in bytes.
    pub max_header_size: usize,
    /// Deepest nesting of multipart containers, counting the outermost.
    pub max_depth: usize,
}

impl ParserConfig {
    /// Creates a configuration with default limits.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub const fn builder() -> ParserConfigBuilder {
        ParserConfigBuilder::new()
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for parser configuration.
#[derive(Debug, Clone, Copy)]
pub struct ParserConfigBuilder {
    high_water_mark: usize,
    max_header_size: usize,
    max_depth: usize,
}

impl ParserConfigBuilder {
    /// Creates a new builder with default limits.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the high-water mark. Values below 1 are raised to 1.
    #[must_use]
    pub const fn high_water_mark(mut self, bytes: usize) -> Self {
        self.high_water_mark = if bytes == 0 { 1 } else { bytes };
        self
    }

    /// Sets the maximum header block size.
    #[must_use]
    pub const fn max_header_size(mut self, bytes: usize) -> Self {
        self.max_header_size = bytes;
        self
    }

    /// Sets the maximum nesting depth. Values below 1 are raised to 1.
    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = if depth == 0 { 1 } else { depth };
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub const fn build(self) -> ParserConfig {
        ParserConfig {
            high_water_mark: self.high_water_mark,
            max_header_size: self.max_header_size,
            max_depth: self.max_depth,
        }
    }
}

impl Default for ParserConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = ParserConfig::new();
        assert_eq!(config.high_water_mark, 16 * 1024);
        assert_eq!(config.max_header_size, 8 * 1024);
        assert_eq!(config.max_depth, 16);
        assert_eq!(config, ParserConfig::default());
    }

    #[test]
    fn test_config_builder() {
        let config = ParserConfig::builder()
            .high_water_mark(64)
            .max_header_size(512)
            .max_depth(3)
            .build();

        assert_eq!(config.high_water_mark, 64);
        assert_eq!(config.max_header_size, 512);
        assert_eq!(config.max_depth, 3);
    }

    #[test]
    fn test_config_builder_clamps_zero() {
        let config = ParserConfig::builder()
            .high_water_mark(0)
            .max_depth(0)
            .build();

        assert_eq!(config.high_water_mark, 1);
        assert_eq!(config.max_depth, 1);
    }
}
