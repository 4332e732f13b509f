//! Local HTTP callback server for OAuth authentication.
//!
//! Provides a temporary localhost server to receive the provider redirect,
//! display a result page to the operator, and pass the callback URL back to
//! the sign-in flow.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, error, info};

/// The port used for the OAuth callback server.
pub const CALLBACK_PORT: u16 = 29167;

/// Result from the callback server.
pub enum CallbackResult {
    /// Successfully received callback with the full URL.
    Success(String),
    /// Server was cancelled.
    Cancelled,
    /// Error occurred.
    Error(String),
}

/// Start the callback server and wait for a single OAuth callback.
///
/// Returns the full callback URL (including query parameters) when received.
/// The server automatically shuts down after receiving the callback.
pub fn start_callback_server(cancel_rx: mpsc::Receiver<()>) -> CallbackResult {
    let addr = format!("127.0.0.1:{}", CALLBACK_PORT);

    let listener = match TcpListener::bind(&addr) {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind callback server to {}: {}", addr, e);
            return CallbackResult::Error(format!("Failed to start server: {}", e));
        }
    };

    // Set non-blocking so we can check for cancellation
    if let Err(e) = listener.set_nonblocking(true) {
        error!("Failed to set non-blocking mode: {}", e);
        return CallbackResult::Error(format!("Server configuration error: {}", e));
    }

    info!("OAuth callback server listening on {}", addr);

    loop {
        // Check for cancellation
        match cancel_rx.try_recv() {
            Ok(()) | Err(mpsc::TryRecvError::Disconnected) => {
                info!("Callback server cancelled");
                return CallbackResult::Cancelled;
            }
            Err(mpsc::TryRecvError::Empty) => {}
        }

        // Try to accept a connection
        match listener.accept() {
            Ok((stream, peer_addr)) => {
                debug!("Connection from {}", peer_addr);
                match handle_connection(stream) {
                    Some(url) => {
                        info!("OAuth callback received");
                        return CallbackResult::Success(url);
                    }
                    None => {
                        // Not a valid callback request, continue listening
                        continue;
                    }
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                // No connection yet, sleep briefly and retry
                std::thread::sleep(Duration::from_millis(100));
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
                return CallbackResult::Error(format!("Connection error: {}", e));
            }
        }
    }
}

/// Handle an incoming HTTP connection.
///
/// Returns Some(url) if this was a valid OAuth callback, None otherwise.
fn handle_connection(mut stream: TcpStream) -> Option<String> {
    // Set read timeout
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));

    let mut buffer = [0; 4096];
    let bytes_read = match stream.read(&mut buffer) {
        Ok(n) => n,
        Err(e) => {
            debug!("Failed to read request: {}", e);
            return None;
        }
    };

    let request = String::from_utf8_lossy(&buffer[..bytes_read]);
    debug!("Received request: {}", request.lines().next().unwrap_or(""));

    // Parse the request line to get the path
    let request_line = request.lines().next()?;
    let parts: Vec<&str> = request_line.split_whitespace().collect();

    if parts.len() < 2 {
        send_error_response(&mut stream, 400, "Bad Request");
        return None;
    }

    let method = parts[0];
    let path = parts[1];

    // Only handle GET requests to /callback
    if method != "GET" {
        send_error_response(&mut stream, 405, "Method Not Allowed");
        return None;
    }

    if !path.starts_with("/callback") {
        send_error_response(&mut stream, 404, "Not Found");
        return None;
    }

    // Check if this is an error callback
    if path.contains("error=") {
        send_result_page(
            &mut stream,
            "Sign-In Failed",
            &error_description(path),
            "You can close this tab and try again.",
        );
        // Still return the URL so the flow can handle the error
        return Some(format!("http://localhost:{}{}", CALLBACK_PORT, path));
    }

    // Check if this has the code parameter
    if !path.contains("code=") {
        send_error_response(&mut stream, 400, "Missing authorization code");
        return None;
    }

    send_result_page(
        &mut stream,
        "Sign-In Successful",
        "You are signed in. The report tool will continue in your terminal.",
        "You can close this tab now.",
    );

    // Return the full callback URL
    Some(format!("http://localhost:{}{}", CALLBACK_PORT, path))
}

/// Extract a human-readable error description from an error callback path.
fn error_description(path: &str) -> String {
    if let Some(start) = path.find("error_description=") {
        let start = start + 18;
        let end = path[start..]
            .find('&')
            .map(|i| start + i)
            .unwrap_or(path.len());
        urlencoding::decode(&path[start..end])
            .unwrap_or_else(|_| "Authentication failed".into())
            .to_string()
    } else {
        "Authentication was cancelled or failed.".to_string()
    }
}

/// Send a minimal result HTML page.
fn send_result_page(stream: &mut TcpStream, title: &str, message: &str, hint: &str) {
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            background: #F3F4F6;
        }}
        .container {{
            background: white;
            padding: 3rem;
            border-radius: 1rem;
            box-shadow: 0 25px 50px -12px rgba(0, 0, 0, 0.25);
            text-align: center;
            max-width: 400px;
        }}
        h1 {{ color: #1F2937; font-size: 1.5rem; margin-bottom: 0.5rem; }}
        p {{ color: #6B7280; margin-bottom: 1.5rem; }}
        .hint {{ font-size: 0.875rem; color: #9CA3AF; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>{title}</h1>
        <p>{message}</p>
        <p class="hint">{hint}</p>
    </div>
</body>
</html>"#
    );

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        html.len(),
        html
    );

    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// Send an error response.
fn send_error_response(stream: &mut TcpStream, status: u16, message: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        message,
        message.len(),
        message
    );

    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
