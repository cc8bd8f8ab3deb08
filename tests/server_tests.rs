use renderware::Handler;
use std::sync::Arc;

mod common;
use common::chain::{filter, rule};
use common::test_server::{header, parse_response, send_request, start};
use common::SITE_ROOT;

fn site_chain() -> Arc<dyn Handler> {
    Arc::new(filter(
        SITE_ROOT,
        vec![
            rule(SITE_ROOT, "/photos", &[".html"]),
            rule(SITE_ROOT, "/", &[".html"]),
        ],
    ))
}

#[test]
fn test_rendered_page_over_tcp() {
    let (handle, addr) = start(site_chain());
    let resp = send_request(&addr, "GET /photos/test.html HTTP/1.1\r\nHost: x\r\n\r\n");
    handle.stop();

    let (status, headers, body) = parse_response(&resp);
    assert_eq!(status, 200);
    assert_eq!(
        body,
        "<!DOCTYPE html><html><head><title>example title</title></head><body>body</body></html>\n"
    );
    assert_eq!(
        header(&headers, "content-length"),
        Some(body.len().to_string().as_str())
    );
    assert_eq!(header(&headers, "content-type"), Some("text/html; charset=utf-8"));
}

#[test]
fn test_template_error_is_500() {
    let (handle, addr) = start(site_chain());
    let resp = send_request(&addr, "GET /malformed.html HTTP/1.1\r\nHost: x\r\n\r\n");
    handle.stop();

    let (status, _, body) = parse_response(&resp);
    assert_eq!(status, 500);
    assert!(body.is_empty());
}

#[test]
fn test_non_template_served_verbatim() {
    let (handle, addr) = start(site_chain());
    let resp = send_request(&addr, "GET /hello.txt HTTP/1.1\r\nHost: x\r\n\r\n");
    handle.stop();

    let (status, headers, body) = parse_response(&resp);
    assert_eq!(status, 200);
    assert_eq!(body, "Hello\n");
    assert_eq!(header(&headers, "content-type"), Some("text/plain; charset=utf-8"));
}

#[test]
fn test_traversal_blocked() {
    let (handle, addr) = start(site_chain());
    let resp = send_request(&addr, "GET /../Cargo.toml HTTP/1.1\r\nHost: x\r\n\r\n");
    handle.stop();

    let (status, _, _) = parse_response(&resp);
    assert_ne!(status, 200);
}

#[test]
fn test_head_has_single_length_and_no_body() {
    let (handle, addr) = start(site_chain());
    let resp = send_request(&addr, "HEAD /photos/test.html HTTP/1.1\r\nHost: x\r\n\r\n");
    handle.stop();

    let (status, headers, body) = parse_response(&resp);
    assert_eq!(status, 200);
    assert!(body.is_empty());
    let lengths: Vec<_> = headers.iter().filter(|(n, _)| n == "content-length").collect();
    assert_eq!(lengths.len(), 1, "content-length headers: {lengths:?}");
    assert_eq!(header(&headers, "content-type"), Some("text/html; charset=utf-8"));
}

#[test]
fn test_percent_encoded_scope_over_tcp() {
    let (handle, addr) = start(site_chain());
    let resp = send_request(&addr, "GET /%70hotos/test.html HTTP/1.1\r\nHost: x\r\n\r\n");
    handle.stop();

    let (status, _, body) = parse_response(&resp);
    assert_eq!(status, 200);
    assert!(!body.contains("{%"), "template source served: {body}");
}
