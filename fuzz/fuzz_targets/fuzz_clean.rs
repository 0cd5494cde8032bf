#![no_main]
use libfuzzer_sys::fuzz_target;
use xsscleanrs::clean;

fuzz_target!(|data: &[u8]| {
    // Cleaning must terminate on any input and never leave a live script tag
    let output = clean(String::from_utf8_lossy(data).into_owned());
    assert!(!output.to_ascii_lowercase().contains("<script"), "script tag survived: {output:?}");
});
