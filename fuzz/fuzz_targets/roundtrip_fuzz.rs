#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let compressed = syaz0::compress(data);
    let header = syaz0::parse_header(&compressed).expect("Compressor wrote an invalid header");
    assert_eq!(header.uncompressed_size as usize, data.len());

    let roundtripped = syaz0::decompress(&compressed).expect("Could not decompress our own output");
    assert!(roundtripped == data, "Decompression result did not match the original input");
    assert!(syaz0::decompress_unsafe(&compressed).unwrap() == data);
});
