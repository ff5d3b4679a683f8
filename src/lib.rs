//! # zlzw
//!
//! Adaptive LZW compression and expansion in the classic `.Z` stream format
//! (Welch, 1984), with block-mode adaptive reset. Structured the way
//! `retrocompressor` structures its codecs: explicit `Options`/`STD_OPTIONS`,
//! a typed `Error`, and `Read`/`Write`-generic entry points with
//! buffer-convenience wrappers alongside them.
//!
//! * [`encoder::encode`] / [`encoder::compress_slice`] — compress a byte stream.
//! * [`decoder::decode`] / [`decoder::expand_slice`] — expand a `.Z` stream.
//! * [`bitio`] — low-level variable-width bit packing shared by both directions.
//! * [`dictionary`] — the encoder's open-addressed `(prefix, byte) -> code` table.
//! * [`reverse_table`] — the decoder's `code -> (prefix, byte)` table.
//!
//! ## File Example
//!
//! ```rs
//! use zlzw::*;
//! let mut in_file = std::fs::File::open("some_input_path").expect("open failed");
//! let mut out_file = std::fs::File::create("some_output_path").expect("create failed");
//! let (bytes_in, bytes_out) = encode(&mut in_file, &mut out_file, &STD_OPTIONS)
//!     .expect("compression failed");
//! eprintln!("compressed {} into {}", bytes_in, bytes_out);
//! ```
//!
//! ## Buffer Example
//!
//! ```rs
//! use zlzw::{compress_slice, expand_slice, STD_OPTIONS};
//! let text = b"the quick brown fox jumps over the lazy dog";
//! let compressed = compress_slice(text, &STD_OPTIONS).expect("compression failed");
//! let expanded = expand_slice(&compressed).expect("expansion failed");
//! assert_eq!(expanded, text);
//! ```

pub mod bitio;
pub mod decoder;
pub mod dictionary;
pub mod encoder;
pub mod error;
pub mod options;
pub mod reverse_table;

pub use decoder::{decode, expand_slice};
pub use encoder::{compress_slice, encode};
pub use error::Error;
pub use options::{Options, STD_OPTIONS};
