//! Mux configuration.

/// Tuning knobs for a [`Mux`](crate::web::Mux).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxConfig {
    /// The maximum number of assembled middleware chains kept idle for reuse.
    pub stack_pool_size: usize,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self { stack_pool_size: 32 }
    }
}
