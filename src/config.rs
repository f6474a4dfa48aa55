/// Deepest container nesting accepted when decoding, unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 500;

/// Options for the decode direction.
///
/// The codec keeps no state between calls; a configuration is passed to each
/// call that needs one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum nesting of arrays, maps and extension payloads in the input
    pub max_depth: usize,
}

impl CodecConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
