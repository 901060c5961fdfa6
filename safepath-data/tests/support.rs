//! A one-shot HTTP server for exercising the adapters without a network.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::JoinHandle;

/// Serve a single request with `status` and a JSON `body`.
///
/// Returns the base URL to point a provider at and a handle yielding the
/// request line that was received.
pub fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
    let address = listener.local_addr().expect("listener address");
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let handle = std::thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept connection");
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("read request line");
        let mut header = String::new();
        while reader.read_line(&mut header).expect("read header") > 2 {
            header.clear();
        }
        reader
            .get_mut()
            .write_all(response.as_bytes())
            .expect("write response");
        request_line.trim_end().to_owned()
    });
    (format!("http://{address}"), handle)
}

/// An address nothing listens on.
pub fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
    let address = listener.local_addr().expect("listener address");
    drop(listener);
    format!("http://{address}")
}

/// Run `future` on a fresh runtime with IO enabled.
pub fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(future)
}
