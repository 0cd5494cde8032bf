#![no_main]
use std::sync::LazyLock;

use libfuzzer_sys::fuzz_target;
use xsscleanrs::Security;

static SECURITY: LazyLock<Security> = LazyLock::new(Security::default);

fuzz_target!(|data: &[u8]| {
    // Fuzz the upload check with arbitrary bytes
    let _ = SECURITY.is_image_safe(data);
});
