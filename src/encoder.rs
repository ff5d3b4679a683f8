//! Adaptive LZW compression to the classic `.Z` stream format, ported from
//! `compress.c`'s `compress()`.
//!
//! The historical encoder batches several input bytes between checks of its
//! widen/adaptive-reset conditions, purely as a performance trick; those
//! conditions are monotonic in the encoder's state, so checking them after
//! every input byte instead is behaviorally identical and much easier to
//! follow. Likewise, the original's fixed-size output buffer with manual
//! flush-and-shift bookkeeping is replaced here by a plain growable buffer:
//! `outbits` is an absolute bit cursor from the start of the stream, so bytes
//! are written through to the sink as soon as no later code can still touch
//! them, with no renumbering required.

use std::io::{BufReader, Read, Write};

use crate::bitio::{align_from, write_code};
use crate::dictionary::{Dictionary, Probe};
use crate::error::Error;
use crate::options::{Options, CLEAR, INIT_BITS};

/// Number of input bytes between adaptive-reset ratio checks, matching
/// `compress.c`'s `CHECK_GAP`.
const CHECK_GAP: u64 = 10_000;

/// Above this input size the ratio computation is done in a reduced
/// precision to avoid overflowing a 32-bit intermediate, matching
/// `compress.c`'s `0x007fffff` guard.
const RATIO_OVERFLOW_GUARD: u64 = 0x007f_ffff;

/// A code's 3-byte write window starting at `outbits >> 3` must always have
/// all three bytes present in the buffer before `write_code` runs.
const TRAILING_WINDOW: usize = 3;

struct Encoder<'w, W: Write> {
    sink: &'w mut W,
    buf: Vec<u8>,
    flushed: usize,
    outbits: usize,
}

impl<'w, W: Write> Encoder<'w, W> {
    fn new(sink: &'w mut W) -> Self {
        Self { sink, buf: Vec::new(), flushed: 0, outbits: 0 }
    }

    fn push_byte(&mut self, b: u8) {
        self.buf.push(b);
        self.outbits += 8;
    }

    fn emit(&mut self, code: usize, n_bits: usize) {
        let need = (self.outbits >> 3) + TRAILING_WINDOW;
        if self.buf.len() < need {
            self.buf.resize(need, 0);
        }
        write_code(&mut self.buf, &mut self.outbits, code, n_bits);
    }

    fn bytes_out_so_far(&self) -> u64 {
        (self.outbits >> 3) as u64
    }

    /// Write through every byte that can no longer receive a future OR-write.
    /// A write at bit offset `o` only ever touches bytes `o>>3 ..= (o>>3)+2`,
    /// and `o` only increases, so anything before the *next* write's starting
    /// byte is done for good.
    fn flush_settled(&mut self) -> Result<(), Error> {
        let settled = self.outbits >> 3;
        if settled > self.flushed {
            self.sink.write_all(&self.buf[self.flushed..settled]).map_err(Error::Write)?;
            self.flushed = settled;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<u64, Error> {
        let total = (self.outbits + 7) >> 3;
        if self.buf.len() < total {
            self.buf.resize(total, 0);
        }
        self.sink.write_all(&self.buf[self.flushed..total]).map_err(Error::Write)?;
        Ok(total as u64)
    }
}

/// Compress `source` into the `.Z` stream format, writing it to `sink`.
/// Returns `(bytes_in, bytes_out)`.
pub fn encode<R: Read, W: Write>(source: &mut R, sink: &mut W, opt: &Options) -> Result<(u64, u64), Error> {
    log::debug!("entering encode loop, max_bits={} block_mode={}", opt.max_bits, opt.block_mode);
    let mut out = Encoder::new(sink);
    out.push_byte(0x1F);
    out.push_byte(0x9D);
    out.push_byte((opt.max_bits as u8) | if opt.block_mode { 0x80 } else { 0 });

    let mut boff = out.outbits;
    let mut n_bits = INIT_BITS;
    let mut extcode = extcode_for(n_bits, opt.max_bits);
    let mut dict = Dictionary::new(opt.max_bits);
    let mut next_free_code = opt.first_code();
    let mut growing = true;

    let mut ratio: u64 = 0;
    let mut checkpoint: u64 = CHECK_GAP;
    let mut bytes_in: u64 = 0;

    let mut reader = BufReader::new(source);
    let mut byte_buf = [0u8; 1];
    let mut w: Option<usize> = None;

    loop {
        let n = reader.read(&mut byte_buf).map_err(Error::Read)?;
        if n == 0 {
            break;
        }
        let b = byte_buf[0];
        bytes_in += 1;

        let prefix = match w {
            None => {
                w = Some(b as usize);
                continue;
            }
            Some(p) => p,
        };

        // Widen and adaptive-reset are only ever decided right after a code
        // has just been emitted and `prefix` is a fresh literal byte (the
        // decoder makes the same decisions at the same code count, since it
        // checks unconditionally before reading every code; the `prefix <
        // FIRST` guard here only skips redundant checks mid-match, it never
        // changes *whether* a transition happens, only lets it land on the
        // byte immediately following the code that triggered it).
        if prefix < opt.first_code() {
            if next_free_code >= extcode {
                if n_bits < opt.max_bits {
                    let aligned = align_from(out.outbits, boff, n_bits);
                    out.outbits = aligned;
                    boff = aligned;
                    n_bits += 1;
                    extcode = extcode_for(n_bits, opt.max_bits);
                    log::debug!("widened to {} bits at {} bytes in", n_bits, bytes_in);
                } else {
                    extcode = usize::MAX;
                    growing = false;
                    log::debug!("dictionary saturated at {} bits, {} bytes in", n_bits, bytes_in);
                }
            }
            if !growing && opt.block_mode && bytes_in >= checkpoint {
                checkpoint = bytes_in + CHECK_GAP;
                let denom = out.bytes_out_so_far();
                let rat = if bytes_in > RATIO_OVERFLOW_GUARD {
                    let r = denom >> 8;
                    if r == 0 { 0x7fff_ffff } else { bytes_in / r }
                } else {
                    (bytes_in << 8) / denom
                };
                if rat >= ratio {
                    ratio = rat;
                } else {
                    ratio = 0;
                    log::debug!("ratio degraded at {} bytes in, emitting CLEAR", bytes_in);
                    dict.clear();
                    out.emit(CLEAR, n_bits);
                    let aligned = align_from(out.outbits, boff, n_bits);
                    out.outbits = aligned;
                    boff = aligned;
                    n_bits = INIT_BITS;
                    next_free_code = opt.first_code();
                    extcode = extcode_for(n_bits, opt.max_bits);
                    growing = true;
                }
            }
        }

        out.flush_settled()?;

        match dict.lookup(prefix, b) {
            Probe::Found(code) => {
                w = Some(code);
            }
            Probe::Empty(slot) => {
                log::trace!("emit code: {}", prefix);
                out.emit(prefix, n_bits);
                if growing {
                    dict.insert_at(slot, next_free_code, prefix, b);
                    next_free_code += 1;
                }
                w = Some(b as usize);
            }
        }
    }

    if let Some(prefix) = w {
        log::trace!("emit final code: {}", prefix);
        out.emit(prefix, n_bits);
    }

    let bytes_out = out.finish()?;
    log::debug!("encode finished: {} bytes in, {} bytes out", bytes_in, bytes_out);
    Ok((bytes_in, bytes_out))
}

/// Compress an in-memory slice, for callers who already have the whole input.
pub fn compress_slice(source: &[u8], opt: &Options) -> Result<Vec<u8>, Error> {
    let mut cursor = source;
    let mut sink = Vec::new();
    encode(&mut cursor, &mut sink, opt)?;
    Ok(sink)
}

/// The code value at which the current width stops being able to represent
/// `next_free_code`. Matches `compress.c`'s `extcode`, which sits one past the
/// last code width `n_bits` can hold, plus a one-code cushion so the widen
/// check can run before the code that would actually overflow is assigned.
fn extcode_for(n_bits: usize, max_bits: usize) -> usize {
    if n_bits < max_bits {
        (1usize << n_bits) + 1
    } else {
        1usize << max_bits
    }
}
