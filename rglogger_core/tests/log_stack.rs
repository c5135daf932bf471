//! Log bridge dispatch, checked against real symbol names.
//!
//! `log::set_boxed_logger` is process-wide, so this binary holds one test.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use log::LevelFilter;
use rglogger_core::{logger, Options, Reporter};

fn read_body(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = stream.read(&mut chunk).unwrap();
        assert!(n > 0);
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
        assert!(n > 0);
        buf.extend_from_slice(&chunk[..n]);
    }

    String::from_utf8_lossy(&buf[head_end..]).into_owned()
}

#[inline(never)]
fn app_handler() {
    log::error!("payment gateway unreachable");
}

#[test]
fn test_logged_error_stack_ends_at_caller() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/entries", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let body = read_body(&mut stream);
        stream
            .write_all(b"HTTP/1.1 202 Accepted\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .unwrap();
        tx.send(body).unwrap();
    });

    let reporter = Reporter::new(Options {
        endpoint,
        timeout: Duration::from_secs(5),
        ..Options::from("k1")
    })
    .unwrap();
    logger::install(Arc::new(reporter), LevelFilter::Error).unwrap();

    app_handler();

    let body = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let error = &json["details"]["error"];

    assert_eq!(error["className"], "ERROR");
    assert_eq!(error["message"], "payment gateway unreachable");

    let trace = error["stackTrace"].as_array().unwrap();
    assert_eq!(trace.last().unwrap()["methodName"], "app_handler");
    for frame in trace {
        let class = frame["className"].as_str().unwrap_or_default();
        assert!(!class.starts_with("log::"), "leaked frame: {frame}");
        assert!(!class.starts_with("rglogger_core"), "leaked frame: {frame}");
    }
}
