//! Options controlling compression and expansion.

/// The build-time ceiling on code width; no stream this crate writes or reads
/// may declare a `max_bits` above this value.
pub const BITS_CEILING: usize = 16;

/// Initial code width in bits, before any widening.
pub const INIT_BITS: usize = 9;

/// Table-clear marker, only meaningful when `block_mode` is set.
pub const CLEAR: usize = 256;

/// First dynamically-assigned code in block mode.
pub const FIRST: usize = 257;

/// Options controlling compression
#[derive(Clone,Copy,Debug)]
pub struct Options {
    /// maximum code width in bits, `9..=16`
    pub max_bits: usize,
    /// whether the stream may contain a CLEAR code and the adaptive-reset heuristic
    /// that emits it; the historical `compress` always sets this
    pub block_mode: bool
}

pub const STD_OPTIONS: Options = Options {
    max_bits: BITS_CEILING,
    block_mode: true
};

impl Options {
    /// first code available for dynamic assignment, given `block_mode`
    pub fn first_code(&self) -> usize {
        if self.block_mode { FIRST } else { CLEAR }
    }
}
