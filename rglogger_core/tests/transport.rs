//! Transport behaviour against a localhost stub server.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rglogger_core::{Capture, Error, Options, Reporter, API_KEY_HEADER, CLIENT_NAME};

/// Reads one HTTP/1.1 request (head and `Content-Length` body).
fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = stream.read(&mut chunk).unwrap();
        assert!(n > 0, "connection closed before headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .map(|v| v.trim().parse::<usize>().unwrap())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = stream.read(&mut chunk).unwrap();
        assert!(n > 0, "connection closed before body");
        buf.extend_from_slice(&chunk[..n]);
    }

    String::from_utf8_lossy(&buf).into_owned()
}

/// Serves a single request with `status_line`, handing the raw request back.
fn stub_server(status_line: &'static str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/entries", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        let response = format!("{status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        stream.write_all(response.as_bytes()).unwrap();
        tx.send(request).unwrap();
    });

    (endpoint, rx)
}

fn reporter(endpoint: String, timeout: Duration) -> Reporter {
    Reporter::new(Options {
        endpoint,
        timeout,
        ..Options::from("k1")
    })
    .unwrap()
}

#[test]
fn test_sends_required_headers_and_json_body() {
    let (endpoint, rx) = stub_server("HTTP/1.1 200 OK");
    let reporter = reporter(endpoint, Duration::from_secs(5));

    let response = reporter.capture_message("boom").unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let request = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let lower = request.to_lowercase();
    assert!(request.starts_with("POST /entries "));
    assert!(lower.contains(&format!("{}: k1\r\n", API_KEY_HEADER.to_lowercase())));
    assert!(lower.contains("content-type: application/json\r\n"));
    assert!(lower.contains(&format!("user-agent: {CLIENT_NAME}\r\n")));

    let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(json["details"]["error"]["message"], "boom");
    assert_eq!(json["details"]["client"]["name"], CLIENT_NAME);
}

#[test]
fn test_error_status_is_not_an_error() {
    let (endpoint, rx) = stub_server("HTTP/1.1 403 Forbidden");
    let reporter = reporter(endpoint, Duration::from_secs(5));

    let response = reporter.emit(Capture::message("denied")).unwrap();
    assert_eq!(response.status().as_u16(), 403);
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
}

#[test]
fn test_stalled_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/entries", listener.local_addr().unwrap());

    thread::spawn(move || {
        let (_stream, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_secs(3));
    });

    let reporter = reporter(endpoint, Duration::from_millis(200));
    let result = reporter.capture_message("never answered");
    assert!(matches!(result, Err(Error::Transport(_))));
}

#[test]
fn test_missing_key_without_fallback_fails() {
    if std::env::var_os(rglogger_core::API_KEY_ENV).is_some() {
        return;
    }
    let result = Reporter::new(Options::default());
    assert!(matches!(result, Err(Error::MissingApiKey)));
}
