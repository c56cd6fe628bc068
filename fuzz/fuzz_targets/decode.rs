#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // we deliberately ignore errors here because random bytes from fuzzer
    // are not valid Yaz0 data and so are expected to trigger non-fatal errors
    let _ = syaz0::decompress(data);
});
