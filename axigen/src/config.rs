//! Synthesizer configuration.
//!
//! Everything here is an explicit value handed to the synthesizer at
//! construction; nothing is process-wide state.

/// Knobs for one synthesis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthConfig {
    /// Data word driven for reads that claim nothing.
    pub default_read_value: u32,

    /// Cycle count behind the emitted `C_MEM_LATENCY` localparam.
    pub mem_latency: usize,
}

impl Default for SynthConfig {
    fn default() -> Self { Self { default_read_value: 0, mem_latency: 2 } }
}

impl SynthConfig {
    /// Replaces the default read value.
    #[must_use]
    pub fn default_read_value(mut self, value: u32) -> Self {
        self.default_read_value = value;
        self
    }

    /// Replaces the memory access latency.
    #[must_use]
    pub fn mem_latency(mut self, cycles: usize) -> Self {
        self.mem_latency = cycles;
        self
    }
}
