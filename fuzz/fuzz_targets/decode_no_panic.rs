#![no_main]
use libfuzzer_sys::fuzz_target;
use zle::{decode_partial, Threshold};

fuzz_target!(|input: (u8, u16, &[u8])| {
    let (n, capacity, comp) = input;
    let Ok(threshold) = Threshold::new(n) else { return };

    // arbitrary input never reads or writes out of bounds
    let mut dst = vec![0u8; capacity as usize];
    let progress = decode_partial(comp, &mut dst, threshold);
    assert!(progress.read <= comp.len());
    assert!(progress.written <= dst.len());
});
