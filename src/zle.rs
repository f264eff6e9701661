use crate::{Progress, Run, Threshold};
use std::io;

/// Decides the run starting at `window[0]`.
///
/// Returns `None` when the window is empty, or when `eof` is false and the
/// outcome depends on bytes not seen yet.
pub(crate) fn classify(window: &[u8], threshold: Threshold, eof: bool) -> Option<Run> {
    let n = threshold.n();
    let first = *window.first()?;
    if first == 0 {
        let max = threshold.max_zero_run();
        let zeros = leading_zeros(window, max);
        if zeros < max && zeros == window.len() && !eof {
            return None;
        }
        if zeros >= n {
            return Some(Run::Zeros(zeros - zeros % n));
        }
        trace!("{zeros} zero bytes are too short for a zero run");
    }

    let mut len = 1;
    while len < n {
        if len == window.len() {
            return if eof { Some(Run::Literal(len)) } else { None };
        }
        // only the first zero of a run needs a look ahead
        if window[len] == 0 && window[len - 1] != 0 {
            let zeros = leading_zeros(&window[len..], n);
            if zeros >= n {
                break;
            }
            if len + zeros == window.len() && !eof {
                return None;
            }
        }
        len += 1;
    }
    Some(Run::Literal(len))
}

#[inline(always)]
fn leading_zeros(window: &[u8], cap: usize) -> usize {
    window.iter().take(cap).take_while(|&&b| b == 0).count()
}

/// Compresses `src` into `dst`, returning the number of bytes written.
///
/// Stops at the last run that fits entirely; use [`encode_partial`] to learn
/// how much of `src` made it.
pub fn encode(src: &[u8], dst: &mut [u8], threshold: Threshold) -> usize {
    encode_partial(src, dst, threshold).written
}

pub fn encode_partial(src: &[u8], dst: &mut [u8], threshold: Threshold) -> Progress {
    let mut progress = Progress::default();
    while let Some(run) = classify(&src[progress.read..], threshold, true) {
        let encoded_len = run.encoded_len();
        if dst.len() - progress.written < encoded_len {
            debug!(
                "destination full: {:?} needs {encoded_len} bytes, {} left, {} of {} source bytes read",
                run,
                dst.len() - progress.written,
                progress.read,
                src.len()
            );
            break;
        }
        let out = &mut dst[progress.written..progress.written + encoded_len];
        out[0] = run.control(threshold);
        if let Run::Literal(len) = run {
            let payload = &src[progress.read..progress.read + len];
            trace!("literal run: {}", hex::encode(payload));
            out[1..].copy_from_slice(payload);
        } else {
            trace!("zero run: {}", run.len());
        }
        progress.read += run.len();
        progress.written += encoded_len;
    }
    progress
}

/// Compresses `src` into `dst` only if that pays off.
///
/// Returns `Some(written)` when the whole source fit and the result is
/// strictly smaller than the source, `None` when the block should be kept
/// uncompressed.
pub fn try_encode(src: &[u8], dst: &mut [u8], threshold: Threshold) -> Option<usize> {
    let progress = encode_partial(src, dst, threshold);
    if progress.is_complete(src.len()) && progress.written < src.len() {
        Some(progress.written)
    } else {
        debug!(
            "not compressible: {} -> {} bytes, {} read",
            src.len(),
            progress.written,
            progress.read
        );
        None
    }
}

/// Streaming encoder.
///
/// Holds back only the bytes whose run is still undecided, at most
/// `128 * n` of them, and writes exactly what [`encode`] would produce for
/// everything fed to it.
///
/// Runs decided by one call go out in a single `write_all`. When that fails
/// the input is kept and the whole batch is written again on the next call,
/// so the writer must not keep part of a failed write.
pub struct Zle<W> {
    threshold: Threshold,
    pending: Vec<u8>,
    batch: Vec<u8>,
    writer: W,
}

impl<W: io::Write> Zle<W> {
    pub fn new(writer: W, threshold: Threshold) -> Self {
        Zle {
            threshold,
            pending: Vec::with_capacity(threshold.n() * 2),
            batch: Vec::with_capacity(threshold.n() * 2),
            writer,
        }
    }

    #[inline(always)]
    pub fn update(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.pending.extend_from_slice(bytes);
        self.drain(false)
    }

    fn drain(&mut self, eof: bool) -> io::Result<()> {
        let mut start = 0;
        self.batch.clear();
        while let Some(run) = classify(&self.pending[start..], self.threshold, eof) {
            self.batch.push(run.control(self.threshold));
            if let Run::Literal(len) = run {
                let payload = &self.pending[start..start + len];
                trace!("literal run: {}", hex::encode(payload));
                self.batch.extend_from_slice(payload);
            } else {
                trace!("zero run: {}", run.len());
            }
            start += run.len();
        }
        if self.batch.is_empty() {
            return Ok(());
        }
        self.writer.write_all(&self.batch)?;
        self.pending.drain(..start);
        trace!("{} bytes pending", self.pending.len());
        Ok(())
    }

    /// Flushes the undecided tail and hands back the writer.
    pub fn finalize(mut self) -> io::Result<W> {
        self.drain(true)?;
        debug_assert!(self.pending.is_empty());
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: io::Write> io::Write for Zle<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
