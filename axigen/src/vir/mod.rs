//! Verilog IR consumed by the synthesizer as its emission sink.

mod ir;

pub use ir::*;
