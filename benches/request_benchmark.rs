use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use webrouter::Request;

fn simple_request_parse_benchmark(c: &mut Criterion) {
    let request = b"GET / HTTP/1.1\r\nHost: localhost:7878\r\nUser-Agent: Test\r\n\r\n";

    c.bench_function("simple_request_parse", |b| {
        b.iter(|| {
            let _ = Request::try_from(black_box(request), 0).unwrap();
        });
    });
}

fn complex_request_parse_benchmark(c: &mut Criterion) {
    let request = b"GET /articles/archive/2024/05?page=2&sort=date+desc HTTP/1.1\r\n\
                    Host: localhost:7878\r\n\
                    User-Agent: Mozilla/5.0 (Windows NT 10.0; Win64; x64)\r\n\
                    Accept: text/html,application/xhtml+xml\r\n\
                    Accept-Language: en-US,en;q=0.9\r\n\
                    Connection: keep-alive\r\n\
                    Upgrade-Insecure-Requests: 1\r\n\
                    \r\n";

    c.bench_function("complex_request_parse", |b| {
        b.iter(|| {
            let request = Request::try_from(black_box(request), 0).unwrap();
            let _ = request.query_params().unwrap();
        });
    });
}

fn request_parse_different_methods_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_parse_methods");

    let requests = [
        ("GET", b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n".as_slice()),
        ("HEAD", b"HEAD / HTTP/1.1\r\nHost: localhost\r\n\r\n".as_slice()),
        (
            "POST",
            b"POST /articles HTTP/1.1\r\nHost: localhost\r\nContent-Length: 11\r\n\r\nhello world".as_slice(),
        ),
        ("OPTIONS", b"OPTIONS /articles HTTP/1.1\r\nHost: localhost\r\n\r\n".as_slice()),
    ];

    for (method, request) in requests.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(method), request, |b, request| {
            b.iter(|| {
                let _ = Request::try_from(black_box(request), 0).unwrap();
            });
        });
    }

    group.finish();
}

fn request_header_count_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_header_count");

    for count in [1, 10, 50].iter() {
        let mut raw = String::from("GET / HTTP/1.1\r\n");
        for i in 0..*count {
            raw.push_str(&format!("X-Header-{}: value-{}\r\n", i, i));
        }
        raw.push_str("\r\n");
        let raw = raw.into_bytes();

        group.bench_with_input(BenchmarkId::from_parameter(count), &raw, |b, raw| {
            b.iter(|| {
                let request = Request::try_from(black_box(raw), 0).unwrap();
                let _ = request.header("x-header-0");
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    simple_request_parse_benchmark,
    complex_request_parse_benchmark,
    request_parse_different_methods_benchmark,
    request_header_count_benchmark
);
criterion_main!(benches);
