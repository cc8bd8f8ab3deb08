#![allow(dead_code)]

pub const SITE_ROOT: &str = "tests/testdata";

pub mod chain {
    use minijinja::Value;
    use renderware::{
        respond, Request, ResponseRecorder, Rule, RuleSet, StaticFiles, TemplateFilter,
        TemplateHelpers,
    };
    use std::path::Path;
    use std::sync::Arc;

    /// Rule over `root` with the given extensions, templates under `site_root`.
    pub fn rule(site_root: &str, root: &str, exts: &[&str]) -> Rule {
        Rule::new(
            root,
            exts.iter().map(|e| e.to_string()).collect(),
            Path::new(site_root),
        )
    }

    pub fn helpers() -> TemplateHelpers {
        TemplateHelpers::new().with("page_title", |_args: &[Value]| Ok(Value::from("root")))
    }

    /// Template filter in front of a static file server, both on `site_root`.
    pub fn filter(site_root: &str, rules: Vec<Rule>) -> TemplateFilter {
        let rules = RuleSet::new(rules);
        let files = StaticFiles::new(site_root).with_index_files(rules.index_files());
        TemplateFilter::new(Arc::new(files), site_root, rules).with_helpers(helpers())
    }

    pub fn get(uri: &str) -> Request {
        http::Request::get(uri).body(Vec::new()).unwrap()
    }

    pub fn run(filter: &TemplateFilter, req: &Request) -> ResponseRecorder {
        respond(filter, req)
    }
}

pub mod test_server {
    use renderware::{FilterService, Handler, HttpServer, ServerHandle};
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener, TcpStream};
    use std::sync::{Arc, Once};
    use std::time::Duration;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x10000);
        });
    }

    pub fn start(handler: Arc<dyn Handler>) -> (ServerHandle, SocketAddr) {
        setup_may_runtime();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let handle = HttpServer(FilterService::new(handler))
            .start(("127.0.0.1", port))
            .unwrap();
        handle.wait_ready().unwrap();
        let addr = handle.addr();
        assert_eq!(addr.port(), port);
        (handle, addr)
    }

    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {:?}", e),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Status, lower-cased headers and body of a raw HTTP/1.1 response.
    pub fn parse_response(resp: &str) -> (u16, Vec<(String, String)>, String) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut status = 0;
        let mut headers = Vec::new();
        for line in head.lines() {
            if line.starts_with("HTTP/1.") {
                status = line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("0")
                    .parse()
                    .unwrap();
            } else if let Some((name, val)) = line.split_once(':') {
                headers.push((name.trim().to_ascii_lowercase(), val.trim().to_string()));
            }
        }
        (status, headers, body.to_string())
    }

    pub fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}
