//! Gmail OAuth2 login
//!
//! Implements the OAuth2 authorization code flow against Google. A local
//! HTTP listener receives the redirect; the exchanged access token starts a
//! new session. Refresh tokens are not used: sessions expire after an hour
//! and the user logs in again.

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use serde::Deserialize;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpListener, TcpStream};
use std::ops::RangeInclusive;
use std::time::Duration;
use url::Url;

use crate::config::GoogleCredentials;
use crate::session::{Session, SessionStore};

/// OAuth2 login flow for Gmail
pub struct GmailAuth {
    client_id: String,
    client_secret: String,
}

/// Token response from Google
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[allow(dead_code)]
    expires_in: Option<u64>,
    #[allow(dead_code)]
    token_type: Option<String>,
}

/// Query parameters Google sends back to the redirect URI
#[derive(Debug, Default, PartialEq, Eq)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
}

impl GmailAuth {
    /// Google OAuth2 endpoints
    const AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";
    const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    /// Profile, email address and read-only Gmail access
    const SCOPES: [&'static str; 3] = [
        "https://www.googleapis.com/auth/userinfo.profile",
        "https://www.googleapis.com/auth/userinfo.email",
        "https://www.googleapis.com/auth/gmail.readonly",
    ];

    pub fn new(credentials: GoogleCredentials) -> Self {
        Self {
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
        }
    }

    /// Build the Google consent URL for a redirect URI
    pub fn authorization_url(&self, redirect_uri: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&include_granted_scopes=true",
            Self::AUTH_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&Self::SCOPES.join(" ")),
        )
    }

    /// Run the interactive login and store the resulting session
    pub fn login(&self, sessions: &dyn SessionStore) -> Result<Session> {
        let loopback = Loopback::bind()?;
        let redirect_uri = loopback.redirect_uri();
        let auth_url = self.authorization_url(&redirect_uri);

        println!("Sign in with Google in your browser.");
        println!("If no browser window opens, visit:\n{}", auth_url);
        if let Err(e) = open::that(&auth_url) {
            warn!("Failed to open browser: {}", e);
        }

        let code = loopback.receive_code()?;
        let access_token = self.exchange_code(&code, &redirect_uri)?;
        let session = sessions.create_session(&access_token)?;

        info!("Signed in, session valid until {}", session.expires_at);
        Ok(session)
    }

    /// Exchange an authorization code for an access token
    fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String> {
        let mut response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
            ])
            .context("Failed to exchange authorization code")?;

        let token: TokenResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse token response")?;

        token
            .access_token
            .filter(|t| !t.is_empty())
            .context("Access token not received from Google")
    }
}

/// Loopback HTTP listener that receives Google's redirect
struct Loopback {
    listener: TcpListener,
    port: u16,
    read_timeout: Duration,
}

impl Loopback {
    /// Ports tried in order; the redirect URI must use one of them
    const PORTS: RangeInclusive<u16> = 8080..=8090;

    /// How long a connection may sit idle before it is dropped
    const READ_TIMEOUT: Duration = Duration::from_secs(5);

    fn bind() -> Result<Self> {
        Self::bind_in(Self::PORTS)
    }

    fn bind_in(ports: RangeInclusive<u16>) -> Result<Self> {
        for port in ports.clone() {
            if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
                let port = listener.local_addr()?.port();
                return Ok(Self {
                    listener,
                    port,
                    read_timeout: Self::READ_TIMEOUT,
                });
            }
        }
        bail!(
            "No free port in {}-{} for the sign-in redirect",
            ports.start(),
            ports.end()
        )
    }

    fn redirect_uri(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    /// Serve requests until one carries a `code` or an `error`
    ///
    /// Unrelated requests (a browser asking for `/favicon.ico`) get a 404.
    /// Connections that send nothing within the read timeout (browser
    /// preconnects) are dropped.
    fn receive_code(&self) -> Result<String> {
        for stream in self.listener.incoming() {
            let mut stream = stream.context("Failed to accept sign-in redirect")?;
            stream
                .set_read_timeout(Some(self.read_timeout))
                .context("Failed to set read timeout")?;

            let mut request_line = String::new();
            if let Err(e) = BufReader::new(&stream).read_line(&mut request_line) {
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) {
                    debug!("Dropping idle connection on the redirect listener");
                    continue;
                }
                return Err(e).context("Failed to read sign-in redirect");
            }

            let params = parse_callback(&request_line);
            match (params.code, params.error) {
                (_, Some(err)) => {
                    respond(
                        &mut stream,
                        "400 Bad Request",
                        "Sign-in failed. Return to Voiceflow and try again.",
                    );
                    bail!("Google sign-in failed: {}", err);
                }
                (Some(code), None) => {
                    respond(&mut stream, "200 OK", "Signed in to Voiceflow. You can close this tab.");
                    return Ok(code);
                }
                (None, None) => respond(&mut stream, "404 Not Found", "Not found"),
            }
        }
        bail!("Sign-in listener closed before the redirect arrived")
    }
}

fn respond(stream: &mut TcpStream, status: &str, message: &str) {
    let body = format!("<html><body><p>{}</p></body></html>", message);
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    if let Err(e) = stream.write_all(response.as_bytes()) {
        debug!("Failed to answer redirect: {}", e);
    }
}

/// Parse `code` and `error` from a request line like
/// `GET /?code=AUTH_CODE&scope=... HTTP/1.1`
fn parse_callback(request_line: &str) -> CallbackParams {
    let Some(target) = request_line.split_whitespace().nth(1) else {
        return CallbackParams::default();
    };
    let Ok(url) = Url::parse("http://localhost").and_then(|base| base.join(target)) else {
        return CallbackParams::default();
    };

    let mut params = CallbackParams::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" if !value.is_empty() => params.code = Some(value.into_owned()),
            "error" => params.error = Some(value.into_owned()),
            _ => {}
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialSource;

    fn auth() -> GmailAuth {
        GmailAuth::new(GoogleCredentials {
            client_id: "client-123.apps.googleusercontent.com".to_string(),
            client_secret: "secret".to_string(),
            source: CredentialSource::Environment,
        })
    }

    #[test]
    fn test_authorization_url() {
        let url = auth().authorization_url("http://localhost:8080");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-123.apps.googleusercontent.com"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080"));
        assert!(url.contains("gmail.readonly"));
        assert!(url.contains("userinfo.email"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("include_granted_scopes=true"));
    }

    #[test]
    fn test_parse_callback_code() {
        let params = parse_callback("GET /?code=4%2F0Abc&scope=email HTTP/1.1\r\n");
        assert_eq!(params.code.as_deref(), Some("4/0Abc"));
        assert_eq!(params.error, None);
    }

    #[test]
    fn test_parse_callback_error() {
        let params = parse_callback("GET /?error=access_denied HTTP/1.1\r\n");
        assert_eq!(params.code, None);
        assert_eq!(params.error.as_deref(), Some("access_denied"));
    }

    #[test]
    fn test_parse_callback_without_query() {
        assert_eq!(parse_callback("GET /favicon.ico HTTP/1.1"), CallbackParams::default());
        assert_eq!(parse_callback(""), CallbackParams::default());
    }

    #[test]
    fn test_parse_callback_empty_code() {
        assert_eq!(parse_callback("GET /?code= HTTP/1.1").code, None);
    }

    fn local_loopback() -> Loopback {
        let mut loopback = Loopback::bind_in(0..=0).unwrap();
        loopback.read_timeout = Duration::from_millis(100);
        loopback
    }

    fn send(port: u16, request: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        stream.write_all(request.as_bytes()).unwrap();
        let mut response = String::new();
        std::io::Read::read_to_string(&mut stream, &mut response).unwrap();
        response
    }

    #[test]
    fn test_loopback_redirect_uri_uses_bound_port() {
        let loopback = local_loopback();
        assert_ne!(loopback.port, 0);
        assert_eq!(loopback.redirect_uri(), format!("http://localhost:{}", loopback.port));
    }

    #[test]
    fn test_loopback_skips_idle_and_unrelated_connections() {
        let loopback = local_loopback();
        let port = loopback.port;

        let client = std::thread::spawn(move || {
            let idle = TcpStream::connect(("127.0.0.1", port)).unwrap();
            let favicon = send(port, "GET /favicon.ico HTTP/1.1\r\n\r\n");
            let redirect = send(port, "GET /?code=4%2F0Abc HTTP/1.1\r\n\r\n");
            drop(idle);
            (favicon, redirect)
        });

        assert_eq!(loopback.receive_code().unwrap(), "4/0Abc");
        let (favicon, redirect) = client.join().unwrap();
        assert!(favicon.starts_with("HTTP/1.1 404"));
        assert!(redirect.starts_with("HTTP/1.1 200"));
    }

    #[test]
    fn test_loopback_reports_oauth_error() {
        let loopback = local_loopback();
        let port = loopback.port;

        let client =
            std::thread::spawn(move || send(port, "GET /?error=access_denied HTTP/1.1\r\n\r\n"));

        let err = loopback.receive_code().unwrap_err();
        assert!(err.to_string().contains("access_denied"));
        assert!(client.join().unwrap().starts_with("HTTP/1.1 400"));
    }
}
