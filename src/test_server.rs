//! One-shot HTTP server on loopback for exercising the client without a network.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct TestServer {
    pub url: String,
    handle: JoinHandle<String>,
}

impl TestServer {
    /// Waits for the single request and returns its raw head.
    pub fn request(self) -> String {
        self.handle.join().unwrap()
    }
}

/// Answers exactly one connection with `HTTP/1.1 <status>` and `body`.
pub fn serve_once(status: &str, body: Vec<u8>) -> TestServer {
    serve_once_with_headers(status, &[], body)
}

pub fn serve_once_with_headers(status: &str, headers: &[(&str, &str)], body: Vec<u8>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let status = status.to_string();
    let extra_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}\r\n"))
        .collect();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();

        let mut head = Vec::new();
        let mut byte = [0u8; 1];
        while !head.ends_with(b"\r\n\r\n") {
            match stream.read(&mut byte) {
                Ok(0) | Err(_) => break,
                Ok(_) => head.push(byte[0]),
            }
        }

        let mut response = format!(
            "HTTP/1.1 {status}\r\n{extra_headers}Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(&body);

        // The client may hang up early on oversized bodies.
        let _ = stream.write_all(&response);
        let _ = stream.flush();

        String::from_utf8_lossy(&head).into_owned()
    });

    TestServer { url, handle }
}

/// Accepts one connection and holds it open for `hold` without answering.
pub fn serve_silently(hold: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            thread::sleep(hold);
            drop(stream);
        }
    });

    url
}

/// A loopback address nothing is listening on.
pub fn unused_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}
