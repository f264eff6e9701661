use crate::{Progress, Run, Threshold};
use std::io;

static ZEROS: [u8; 1024] = [0; 1024];

/// Decompresses `src` into `dst`, returning the number of bytes written.
///
/// A run that does not fit, or whose literal payload is cut short in `src`,
/// ends decoding before anything of it is written.
pub fn decode(src: &[u8], dst: &mut [u8], threshold: Threshold) -> usize {
    decode_partial(src, dst, threshold).written
}

pub fn decode_partial(src: &[u8], dst: &mut [u8], threshold: Threshold) -> Progress {
    let mut progress = Progress::default();
    while progress.read < src.len() && progress.written < dst.len() {
        let control = src[progress.read];
        let run = Run::from_control(control, threshold);
        let len = run.len();
        let room = dst.len() - progress.written;
        let out = progress.written..progress.written + len;
        match run {
            Run::Literal(_) => {
                let payload = progress.read + 1..progress.read + 1 + len;
                if payload.end > src.len() || room < len {
                    debug!(
                        "literal run of {len} stopped: {} source bytes, {room} destination bytes left",
                        src.len() - progress.read - 1
                    );
                    break;
                }
                trace!("literal run: {}", hex::encode(&src[payload.clone()]));
                dst[out].copy_from_slice(&src[payload]);
                progress.read += 1 + len;
            }
            Run::Zeros(_) => {
                if room < len {
                    debug!("zero run of {len} stopped: {room} destination bytes left");
                    break;
                }
                trace!("zero run: {len}");
                dst[out].fill(0);
                progress.read += 1;
            }
        }
        progress.written += len;
    }
    progress
}

/// Streaming decoder.
///
/// A literal run may be split across any number of writes.
pub struct DeZle<W> {
    threshold: Threshold,
    // literal bytes still owed by the last control byte
    literal: usize,
    writer: W,
}

impl<W: io::Write> DeZle<W> {
    pub fn new(writer: W, threshold: Threshold) -> DeZle<W> {
        DeZle {
            threshold,
            literal: 0,
            writer,
        }
    }

    #[inline(always)]
    pub fn update(&mut self, mut enc: &[u8]) -> io::Result<()> {
        while !enc.is_empty() {
            if self.literal != 0 {
                let take = self.literal.min(enc.len());
                trace!("literal bytes: {}", hex::encode(&enc[..take]));
                self.writer.write_all(&enc[..take])?;
                self.literal -= take;
                enc = &enc[take..];
                continue;
            }
            match Run::from_control(enc[0], self.threshold) {
                Run::Literal(len) => {
                    trace!("literal run: {len}");
                    self.literal = len;
                }
                Run::Zeros(mut len) => {
                    trace!("zero run: {len}");
                    while len != 0 {
                        let take = len.min(ZEROS.len());
                        self.writer.write_all(&ZEROS[..take])?;
                        len -= take;
                    }
                }
            }
            enc = &enc[1..];
        }
        Ok(())
    }

    /// Checks that the stream ended on a run boundary and hands back the
    /// writer.
    pub fn finalize(mut self) -> io::Result<W> {
        if self.literal != 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("compressed stream ends {} bytes into a literal run", self.literal),
            ));
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: io::Write> io::Write for DeZle<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::{decode, decode_partial, DeZle};
    use crate::zle::tests::{setup, sparse_block, threshold, SCENARIO};
    use crate::{compress_bound, encode, encode_partial, Progress, Threshold};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::io::{ErrorKind, Write};

    /// (threshold, input, expected)
    const TEST_VECTOR: [(u8, &str, &str); 6] = [
        (
            8,
            "07000000000c000000070000ff000002080a0700000080000000000008",
            "000000000c0000000000ff000002080a000000800000000008",
        ),
        (
            2,
            "03000c030100ff02010208000a02010080030008",
            "000000000c0000000000ff000002080a000000800000000008",
        ),
        (4, "07", "00000000000000000000000000000000"),
        (4, "0201020304", "010203"),
        (1, "000101", "0100"),
        (2, "05", "0000000000000000"),
    ];

    fn roundtrip(src: &[u8], n: Threshold) {
        let mut enc = vec![0u8; compress_bound(src.len(), n)];
        let written = encode(src, &mut enc, n);
        let mut dec = vec![0xAAu8; src.len()];
        let progress = decode_partial(&enc[..written], &mut dec, n);
        assert_eq!(progress, Progress { read: written, written: src.len() });
        assert_eq!(src, &dec[..], "n = {}", n.get());
    }

    #[test]
    fn test_dezle_decode() {
        setup();
        for (n, input, expected) in TEST_VECTOR.into_iter() {
            let input = hex::decode(input).unwrap();
            let expected = hex::decode(expected).unwrap();
            let mut dst = vec![0xAAu8; expected.len()];
            let written = decode(&input, &mut dst, threshold(n));
            assert_eq!(expected, dst[..written], "n = {n}");
        }
    }

    #[test]
    fn test_largest_zero_run() {
        let mut dst = vec![0xAAu8; 128 * 128];
        assert_eq!(decode(&[0xFF], &mut dst, threshold(128)), 128 * 128);
        assert!(dst.iter().all(|&b| b == 0));

        // beyond what the encoder emits, still a valid zero run
        let mut dst = vec![0xAAu8; 2000];
        assert_eq!(decode(&[0xFF], &mut dst, threshold(8)), 1984);
        assert!(dst[..1984].iter().all(|&b| b == 0));
        assert_eq!(dst[1984..], [0xAA; 16]);

        let mut out = vec![];
        let mut dezle = DeZle::new(&mut out, threshold(8));
        dezle.update(&[0xFF, 0x00, 0x01]).unwrap();
        dezle.finalize().unwrap();
        assert_eq!(out.len(), 1985);
        assert_eq!(out[1984], 0x01);
    }

    #[test]
    fn test_scenario_roundtrip() {
        setup();
        let mut enc = [0u8; 25];
        let written = encode(&SCENARIO, &mut enc, threshold(2));
        let mut dec = [0u8; 25];
        assert_eq!(decode(&enc[..written], &mut dec, threshold(2)), 25);
        assert_eq!(dec, SCENARIO);

        roundtrip(&SCENARIO, threshold(8));
    }

    #[test]
    fn test_truncated_encoding_decodes_to_prefix() {
        setup();
        let mut enc = [0u8; 25];
        let written = encode(&SCENARIO, &mut enc, threshold(8));
        let mut dec = [0u8; 25];
        let decoded = decode(&enc[..written], &mut dec, threshold(8));
        assert_eq!(decoded, 16);
        assert_eq!(dec[..decoded], SCENARIO[..decoded]);

        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            let n = threshold(rng.gen_range(1..=128u8));
            let len = rng.gen_range(1..2048);
            let src = sparse_block(&mut rng, len);
            let mut enc = vec![0u8; rng.gen_range(0..compress_bound(src.len(), n))];
            let progress = encode_partial(&src, &mut enc, n);
            let mut dec = vec![0xAAu8; src.len()];
            let decoded = decode(&enc[..progress.written], &mut dec, n);
            assert_eq!(decoded, progress.read);
            assert_eq!(dec[..decoded], src[..decoded]);
        }
    }

    #[test]
    fn test_short_compressed_stream() {
        // literal announces 4 bytes, only 2 follow
        let mut dst = [0u8; 16];
        let progress = decode_partial(&hex::decode("00010301ab").unwrap(), &mut dst, threshold(4));
        assert_eq!(progress, Progress { read: 2, written: 1 });
        assert_eq!(dst[0], 0x01);
    }

    #[test]
    fn test_small_destination() {
        let n4 = threshold(4);
        // zero run of 8 into 6 bytes
        let mut dst = [0xAAu8; 6];
        assert_eq!(decode(&[0x05], &mut dst, n4), 0);
        assert_eq!(dst, [0xAA; 6]);
        // literal of 4 into 3 bytes
        assert_eq!(decode(&[0x03, 1, 2, 3, 4], &mut dst[..3], n4), 0);
        // exactly full destination leaves the rest of the stream unread
        let progress = decode_partial(&[0x04, 0x00, 0x09], &mut dst[..4], n4);
        assert_eq!(progress, Progress { read: 1, written: 4 });
        assert_eq!(decode(&[0x04], &mut [], n4), 0);
    }

    #[test]
    fn test_roundtrip_all_thresholds() {
        setup();
        let mut rng = StdRng::seed_from_u64(0xdead);
        for n in 1..=128u8 {
            let len = rng.gen_range(0..3000);
            let src = sparse_block(&mut rng, len);
            roundtrip(&src, threshold(n));
            roundtrip(&vec![0u8; 128 * n as usize + 1], threshold(n));
        }
        roundtrip(&[], threshold(8));
        roundtrip(&[7u8; 1000], threshold(8));
    }

    #[test]
    fn test_streaming_decoder() {
        setup();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let n = threshold(rng.gen_range(1..=128u8));
            let len = rng.gen_range(0..4096);
            let src = sparse_block(&mut rng, len);
            let mut enc = vec![0u8; compress_bound(src.len(), n)];
            let written = encode(&src, &mut enc, n);

            let mut dezle = DeZle::new(Vec::new(), n);
            let mut rest = &enc[..written];
            while !rest.is_empty() {
                let take = rng.gen_range(1..=13usize).min(rest.len());
                dezle.write_all(&rest[..take]).unwrap();
                rest = &rest[take..];
            }
            assert_eq!(src, dezle.finalize().unwrap());
        }
    }

    #[test]
    fn test_streaming_decoder_truncated_literal() {
        setup();
        let mut out = vec![];
        let mut dezle = DeZle::new(&mut out, threshold(4));
        dezle.update(&[0x04, 0x03, 0x01, 0x02]).unwrap();
        let err = dezle.finalize().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
        assert_eq!(out, [0, 0, 0, 0, 1, 2]);
    }
}
