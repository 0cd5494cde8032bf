use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use xsscleanrs::{clean, Security};

fn bench_clean_simple(c: &mut Criterion) {
    let test_cases = vec![
        "<script>alert('xss')</script>",
        "<img src=x onerror=alert(1)>",
        "<iframe src=javascript:alert(1)></iframe>",
        "javascript:alert('xss')",
        "<div onclick=alert(1)>click</div>",
        "Hello world",
        "<p>Safe content</p>",
        "data:text/html;base64,PHNjcmlwdD5hbGVydCgxKTwvc2NyaXB0Pg==",
    ];

    c.bench_function("clean", |b| {
        b.iter(|| {
            for case in &test_cases {
                black_box(clean(String::from(*case)));
            }
        })
    });
}

fn bench_clean_individual(c: &mut Criterion) {
    let mut group = c.benchmark_group("clean_individual");
    let security = Security::default();

    let test_cases = vec![
        ("script_tag", "<script>alert('xss')</script>"),
        ("img_onerror", "<img src=x onerror=alert(1)>"),
        ("iframe_js", "<iframe src=javascript:alert(1)></iframe>"),
        ("entity_encoded", "<a href=\"&#x6A;&#x61;&#x76;&#x61;&#x73;&#x63;&#x72;&#x69;&#x70;&#x74;:x\">y</a>"),
        ("percent_encoded", "%3Cscript%3Ealert(1)%3C%2Fscript%3E"),
        ("event_handler", "<div onclick=alert(1)>click</div>"),
        ("safe_text", "Hello world"),
        ("safe_html", "<p>Safe <b>content</b></p>"),
    ];

    for (name, input) in test_cases {
        group.bench_function(name, |b| b.iter(|| black_box(security.clean_str(black_box(input)))));
    }

    group.finish();
}

fn bench_clean_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("clean_input_sizes");
    let security = Security::default();

    let base_xss = "<script>alert('xss')</script>";
    let sizes = vec![10, 50, 100, 500, 1000, 5000];

    for size in sizes {
        let mut input = base_xss.to_string();
        while input.len() < size {
            input.push_str("<div title=\"x\">content</div>");
        }
        input.truncate(size);

        group.bench_function(format!("size_{}", size), |b| {
            b.iter(|| black_box(security.clean_str(black_box(&input))))
        });
    }

    group.finish();
}

fn bench_clean_json(c: &mut Criterion) {
    let payload = json!({
        "name": "<b onclick=steal()>Robert</b>",
        "comments": ["nice", "<svg/onload=alert(1)>", "<a href=\"javascript:x\">y</a>"],
        "age": 42,
    });

    c.bench_function("clean_json", |b| b.iter(|| black_box(clean(black_box(payload.clone())))));
}

criterion_group!(benches, bench_clean_simple, bench_clean_individual, bench_clean_sizes, bench_clean_json);
criterion_main!(benches);
