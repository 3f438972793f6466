//! Loopback HTTP listener receiving the OAuth authorization redirect.

use std::time::Duration;

use log::{debug, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

use crate::error::CredentialError;

const SUCCESS_BODY: &str =
    "<html><body><h3>Authorization complete.</h3><p>You may close this window.</p></body></html>";

/// Outcome of one inbound request on the loopback listener
#[derive(Debug, Clone, PartialEq, Eq)]
enum Callback {
    Code(String),
    Denied(String),
    /// Unrelated request (favicon, probes); keep waiting
    Ignored,
}

pub struct CallbackServer {
    listener: TcpListener,
    port: u16,
    expected_state: String,
}

impl CallbackServer {
    /// Bind on 127.0.0.1. Port 0 picks a free port.
    pub async fn bind(port: u16, expected_state: String) -> Result<Self, CredentialError> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let port = listener.local_addr()?.port();
        Ok(Self {
            listener,
            port,
            expected_state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/", self.port)
    }

    /// Serve requests until the redirect carrying `code` arrives or the timeout elapses.
    pub async fn wait_for_code(self, timeout: Duration) -> Result<String, CredentialError> {
        tokio::time::timeout(timeout, self.accept_loop())
            .await
            .map_err(|_| CredentialError::Callback("timed out waiting for authorization".into()))?
    }

    async fn accept_loop(&self) -> Result<String, CredentialError> {
        loop {
            let (mut stream, peer) = self.listener.accept().await?;
            debug!("OAuth callback connection from {}", peer);

            let Some(target) = read_request_target(&mut stream).await else {
                continue;
            };

            match parse_callback(&target, &self.expected_state) {
                Ok(Callback::Code(code)) => {
                    respond(&mut stream, "200 OK", SUCCESS_BODY).await;
                    return Ok(code);
                }
                Ok(Callback::Denied(reason)) => {
                    respond(&mut stream, "200 OK", "Authorization was denied.").await;
                    return Err(CredentialError::Denied(reason));
                }
                Ok(Callback::Ignored) => {
                    respond(&mut stream, "404 Not Found", "Not found").await;
                }
                Err(e) => {
                    respond(&mut stream, "400 Bad Request", &e.to_string()).await;
                    return Err(e);
                }
            }
        }
    }
}

/// Request target of a `GET` request line, e.g. `/?state=..&code=..`
async fn read_request_target(stream: &mut TcpStream) -> Option<String> {
    let mut buffer = [0u8; 4096];
    let n = match stream.read(&mut buffer).await {
        Ok(n) => n,
        Err(e) => {
            warn!("Failed to read OAuth callback request: {}", e);
            return None;
        }
    };
    let request = String::from_utf8_lossy(&buffer[..n]);
    let mut parts = request.lines().next()?.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Some(target.to_string()),
        _ => None,
    }
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        warn!("Failed to answer OAuth callback request: {}", e);
    }
    let _ = stream.shutdown().await;
}

fn parse_callback(target: &str, expected_state: &str) -> Result<Callback, CredentialError> {
    let url = Url::parse(&format!("http://localhost{target}"))
        .map_err(|e| CredentialError::Callback(format!("malformed redirect: {e}")))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if code.is_none() && error.is_none() {
        return Ok(Callback::Ignored);
    }
    if state.as_deref() != Some(expected_state) {
        return Err(CredentialError::Callback("state mismatch".into()));
    }
    if let Some(error) = error {
        return Ok(Callback::Denied(error));
    }
    Ok(code.map(Callback::Code).unwrap_or(Callback::Ignored))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_code_with_matching_state() {
        let parsed = parse_callback("/?state=xyz&code=4%2Fabc&scope=tasks", "xyz").unwrap();
        assert_eq!(parsed, Callback::Code("4/abc".to_string()));
    }

    #[test]
    fn rejects_state_mismatch() {
        let err = parse_callback("/?state=other&code=abc", "xyz").unwrap_err();
        assert!(matches!(err, CredentialError::Callback(_)));
    }

    #[test]
    fn reports_denied_consent() {
        let parsed = parse_callback("/?state=xyz&error=access_denied", "xyz").unwrap();
        assert_eq!(parsed, Callback::Denied("access_denied".to_string()));
    }

    #[test]
    fn ignores_unrelated_paths() {
        assert_eq!(
            parse_callback("/favicon.ico", "xyz").unwrap(),
            Callback::Ignored
        );
    }

    #[tokio::test]
    async fn serves_redirect_and_returns_code() {
        let server = CallbackServer::bind(0, "state-1".to_string()).await.unwrap();
        let port = server.port();
        assert_eq!(server.redirect_uri(), format!("http://localhost:{port}/"));

        let waiter = tokio::spawn(server.wait_for_code(Duration::from_secs(5)));

        let mut probe = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        probe
            .write_all(b"GET /favicon.ico HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut sink = Vec::new();
        probe.read_to_end(&mut sink).await.unwrap();
        assert!(String::from_utf8_lossy(&sink).starts_with("HTTP/1.1 404"));

        let mut redirect = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        redirect
            .write_all(b"GET /?state=state-1&code=the-code HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut body = Vec::new();
        redirect.read_to_end(&mut body).await.unwrap();
        assert!(String::from_utf8_lossy(&body).starts_with("HTTP/1.1 200"));

        assert_eq!(waiter.await.unwrap().unwrap(), "the-code");
    }

    #[tokio::test]
    async fn times_out_without_redirect() {
        let server = CallbackServer::bind(0, "s".to_string()).await.unwrap();
        let err = server
            .wait_for_code(Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::Callback(_)));
    }
}
