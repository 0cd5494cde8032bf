use serde_json::json;
use xsscleanrs::{clean, version, Security};

fn main() {
    println!("Testing xsscleanrs {} functionality...", version());

    let snippets = [
        ("<script>alert('xss')</script>", "Script tag"),
        ("<img src=x onerror=alert(1)>", "Event handler"),
        ("Hello <b>world</b>", "Safe HTML"),
        ("<a href=\"javascript:alert(1)\">click</a>", "Javascript protocol"),
        ("<iframe src=//example.com>", "Naughty tag"),
    ];

    println!("\n=== Strings ===");
    for (input, description) in &snippets {
        println!("{}: {} -> {}", description, input, clean(String::from(*input)));
    }

    println!("\n=== JSON ===");
    let payload = json!({
        "title": "<b onclick=steal()>Hi</b>",
        "tags": ["ok", "<svg/onload=alert(1)>"],
        "count": 3,
    });
    println!("{}", clean(payload));

    println!("\n=== Image upload ===");
    let security = Security::default();
    for (content, description) in [
        (&b"GIF89a plain pixels"[..], "Plain image"),
        (&b"GIF89a<?php system($_GET['c']); ?>"[..], "Embedded PHP"),
    ] {
        println!("{}: safe = {}", description, security.is_image_safe(content));
    }
}
