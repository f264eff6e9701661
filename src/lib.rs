//! # ZLE Encoding Scheme
//!
//! Every run in the compressed stream starts with one control byte. The
//! threshold `n` (`1..=128`) splits the control byte value space in two:
//!
//! ```text
//!         0              n-1 n                         255
//!         │                │ │                           │
//!         ▼                ▼ ▼                           ▼
//!         ├── LITERAL ─────┤ ├── ZERO RUN ───────────────┤
//! ```
//!
//! A control byte `v < n` is followed by `v + 1` raw bytes, copied verbatim.
//!
//! A control byte `v >= n` carries no payload and stands for
//! `(v - n + 1) * n` zero bytes.
//!
//! Thus a literal run holds at most `n` bytes and a zero run is always a
//! multiple of `n`. The encoder caps zero runs at `128 * n` bytes (control
//! bytes `n..=n+127`); the decoder accepts the whole range and expands
//! `255` to `(256 - n) * n` bytes.
//! Zero runs shorter than `n` are folded into the surrounding literal.
//! In the worst case (no zero run of `n` bytes anywhere) one control byte is
//! spent per `n` source bytes, see [`compress_bound`].
//!
//! The stream does not include `n` nor the decompressed size.
//! The decoder MUST be given the same `n` the encoder used.
//!
//! # Bounded Buffers
//!
//! [`encode`] and [`decode`] never allocate and never touch bytes beyond the
//! destination slice. When the destination runs out they stop at a run
//! boundary and report what was written; callers compare the counts against
//! their own expectations. [`Zle`] and [`DeZle`] are the unbounded streaming
//! counterparts over any [`std::io::Write`].

#[macro_use]
extern crate log;

mod dezle;
mod error;
mod zle;

pub use dezle::{decode, decode_partial, DeZle};
pub use error::Error;
pub use zle::{encode, encode_partial, try_encode, Zle};

pub const MIN_THRESHOLD: u8 = 1;
pub const MAX_THRESHOLD: u8 = 128;
/// threshold used for filesystem metadata blocks
pub const DEFAULT_THRESHOLD: u8 = 64;
/// the encoder emits zero runs of at most this many multiples of `n`
pub const MAX_ZERO_RUN_MULTIPLE: usize = 128;

/// The literal/zero split of the control byte, agreed out-of-band between
/// encoder and decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Threshold(u8);

impl Threshold {
    pub fn new(n: u8) -> Result<Self, Error> {
        if (MIN_THRESHOLD..=MAX_THRESHOLD).contains(&n) {
            Ok(Threshold(n))
        } else {
            Err(Error::InvalidThreshold(n))
        }
    }

    #[inline(always)]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Longest zero run the encoder packs into one control byte.
    #[inline(always)]
    pub fn max_zero_run(self) -> usize {
        MAX_ZERO_RUN_MULTIPLE * self.n()
    }

    #[inline(always)]
    pub(crate) fn n(self) -> usize {
        self.0 as usize
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold(DEFAULT_THRESHOLD)
    }
}

impl TryFrom<u8> for Threshold {
    type Error = Error;

    fn try_from(n: u8) -> Result<Self, Error> {
        Threshold::new(n)
    }
}

/// Bytes consumed from the input and produced into the output by one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub read: usize,
    pub written: usize,
}

impl Progress {
    /// Whether the call got through all `input_len` bytes of its input.
    #[inline]
    pub fn is_complete(&self, input_len: usize) -> bool {
        self.read == input_len
    }
}

/// Worst-case compressed size of `src_len` bytes.
///
/// A destination of this size always lets [`encode`] consume the whole
/// source.
pub fn compress_bound(src_len: usize, threshold: Threshold) -> usize {
    let n = threshold.n();
    src_len + (src_len + n - 1) / n
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Run {
    Literal(usize),
    Zeros(usize),
}

impl Run {
    #[inline(always)]
    pub(crate) fn from_control(control: u8, threshold: Threshold) -> Run {
        let (v, n) = (control as usize, threshold.n());
        if v < n {
            Run::Literal(v + 1)
        } else {
            Run::Zeros((v - n + 1) * n)
        }
    }

    #[inline(always)]
    pub(crate) fn control(self, threshold: Threshold) -> u8 {
        let n = threshold.n();
        match self {
            Run::Literal(len) => {
                debug_assert!(len >= 1 && len <= n);
                (len - 1) as u8
            }
            Run::Zeros(len) => {
                debug_assert!(len >= n && len % n == 0);
                debug_assert!(len <= threshold.max_zero_run());
                (n + len / n - 1) as u8
            }
        }
    }

    /// Source bytes covered by the run.
    #[inline(always)]
    pub(crate) fn len(self) -> usize {
        match self {
            Run::Literal(len) | Run::Zeros(len) => len,
        }
    }

    /// Bytes the run takes in the compressed stream.
    #[inline(always)]
    pub(crate) fn encoded_len(self) -> usize {
        match self {
            Run::Literal(len) => 1 + len,
            Run::Zeros(_) => 1,
        }
    }
}
