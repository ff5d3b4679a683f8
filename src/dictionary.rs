//! Encoder hash table: `(prefix_code, next_byte) -> code`, open-addressed with
//! double hashing ("G. Knott's relatively-prime secondary probe"), ported from
//! the non-`FAST` branch of `compress.c`'s `htabof`/`codetabof` tables.
//!
//! This is the "compact variant" named in the format notes: canonical for
//! compatibility, at the cost of a lower load factor than the `FAST` variant
//! at `MAX_BITS == 16`.

/// Slots empty since the last `clear()`, keyed by `max_bits`, sized to keep
/// occupancy at `next_free_code < 2^max_bits` comfortably under 100%. Mirrors
/// `compress.c`'s `HSIZE` ladder exactly.
fn hsize_for(max_bits: usize) -> usize {
    match max_bits {
        16 => 69001,
        15 => 35023,
        14 => 18013,
        13 => 9001,
        _ => 5003
    }
}

const EMPTY: u32 = u32::MAX;

fn signature(prefix: usize, byte: u8) -> u32 {
    (prefix as u32) | ((byte as u32) << 24)
}

/// Result of a dictionary probe.
pub enum Probe {
    /// `(prefix, byte)` is already in the table, mapped to this code.
    Found(usize),
    /// `(prefix, byte)` is not in the table; this is the empty slot where it
    /// would be inserted.
    Empty(usize)
}

pub struct Dictionary {
    max_bits: usize,
    hsize: usize,
    sig: Vec<u32>,
    code: Vec<u16>
}

impl Dictionary {
    pub fn new(max_bits: usize) -> Self {
        let hsize = hsize_for(max_bits);
        Self {
            max_bits,
            hsize,
            sig: vec![EMPTY; hsize],
            code: vec![0; hsize]
        }
    }

    /// Mark every slot empty.
    pub fn clear(&mut self) {
        self.sig.fill(EMPTY);
    }

    /// Locate the slot for `(prefix, byte)`.
    pub fn lookup(&self, prefix: usize, byte: u8) -> Probe {
        let want = signature(prefix, byte);
        let h0 = ((byte as usize) << (self.max_bits - 8)) ^ prefix;
        debug_assert!(h0 < self.hsize);
        if self.sig[h0] == want {
            return Probe::Found(self.code[h0] as usize);
        }
        if self.sig[h0] == EMPTY {
            return Probe::Empty(h0);
        }
        // secondary hash (after G. Knott): step by a fixed displacement
        // relative to HSIZE until we find a match or an empty slot.
        let disp = (self.hsize - h0) - 1;
        let mut h = h0;
        loop {
            h = if h < disp { h + self.hsize - disp } else { h - disp };
            if self.sig[h] == want {
                return Probe::Found(self.code[h] as usize);
            }
            if self.sig[h] == EMPTY {
                return Probe::Empty(h);
            }
        }
    }

    /// Record `(prefix, byte) -> code` at a slot previously returned by
    /// `lookup` as `Probe::Empty`.
    pub fn insert_at(&mut self, slot: usize, code: usize, prefix: usize, byte: u8) {
        self.sig[slot] = signature(prefix, byte);
        self.code[slot] = code as u16;
    }

    /// Number of occupied slots, for the occupancy invariant in tests.
    #[cfg(test)]
    pub fn occupied(&self) -> usize {
        self.sig.iter().filter(|&&s| s != EMPTY).count()
    }
}
