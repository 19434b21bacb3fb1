// Shared helpers: a one-shot HTTP listener on 127.0.0.1 standing in for the
// hosting service, and scratch files under the temp dir.
#![allow(dead_code)]

use nullpointer::cli::{Args, Parsed};
use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

/// Accept one connection, answer it with `status`, `headers` and `body`, and
/// hand back the request as lowercase text with any chunked body decoded.
pub fn serve_once(status: &str, headers: &[(&str, &str)], body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let mut response = format!("HTTP/1.1 {status}\r\nContent-Length: {}\r\n", body.len());
    for (name, value) in headers {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    response.push_str("Connection: close\r\n\r\n");
    response.push_str(body);

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        request
    });
    (format!("http://{addr}/"), handle)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).unwrap();
        assert!(n > 0, "connection closed before the request was complete");
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let body = &buf[end + 4..];

        let length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());
        let decoded = match length {
            Some(length) if body.len() >= length => Some(body[..length].to_vec()),
            Some(_) => None,
            None => dechunk(body),
        };
        if let Some(decoded) = decoded {
            let body = String::from_utf8_lossy(&decoded).to_ascii_lowercase();
            return format!("{head}\r\n\r\n{body}");
        }
    }
}

/// Decode a chunked body, or `None` while the final chunk has not arrived.
fn dechunk(mut body: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    loop {
        let line_end = body.windows(2).position(|w| w == b"\r\n")?;
        let size = std::str::from_utf8(&body[..line_end]).ok()?;
        let size = usize::from_str_radix(size.split(';').next()?.trim(), 16).ok()?;
        body = &body[line_end + 2..];
        if size == 0 {
            return Some(out);
        }
        if body.len() < size + 2 {
            return None;
        }
        out.extend_from_slice(&body[..size]);
        body = &body[size + 2..];
    }
}

pub fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("nullpointer-{test}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn scratch_file(test: &str, name: &str, contents: &str) -> PathBuf {
    let path = scratch_dir(test).join(name);
    fs::write(&path, contents).unwrap();
    path
}

pub fn args(list: &[&str]) -> Args {
    match Args::parse_from_args(std::iter::once("0x0").chain(list.iter().copied())).unwrap() {
        Parsed::Upload(args) => args,
        Parsed::Info(info) => panic!("unexpected info output: {info}"),
    }
}
