//! Error taxonomy shared by the encoder, decoder, and CLI.

/// Everything that can go wrong while running the codec.
///
/// This stands in for the abstract `outcome` enum of the format: `Ok` is simply
/// `Result::Ok`, and every other outcome has a variant here.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("read error")]
    Read(#[source] std::io::Error),
    #[error("write error")]
    Write(#[source] std::io::Error),
    #[error("compressed with {found} bits, can only handle {max} bits")]
    UnsupportedBits { found: usize, max: usize },
    #[error("not in compressed format")]
    NotCompressed,
    #[error("corrupt input: {0}")]
    CorruptInput(&'static str)
}
