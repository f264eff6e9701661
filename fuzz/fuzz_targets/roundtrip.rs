#![no_main]
use libfuzzer_sys::fuzz_target;
use zle::{compress_bound, decode, encode_partial, Threshold};

fuzz_target!(|input: (u8, &[u8])| {
    let (n, data) = input;
    let Ok(threshold) = Threshold::new(n) else { return };

    let mut enc = vec![0u8; compress_bound(data.len(), threshold)];
    let progress = encode_partial(data, &mut enc, threshold);
    assert!(progress.is_complete(data.len()));

    let mut dec = vec![0u8; data.len()];
    assert_eq!(decode(&enc[..progress.written], &mut dec, threshold), data.len());
    assert_eq!(dec.as_slice(), data);
});
