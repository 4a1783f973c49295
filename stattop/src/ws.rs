//! WebSocket client for the agent's per-container stats streams.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, http::StatusCode, Message};
use tokio_tungstenite::{
    connect_async, connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream,
};
use tracing::debug;
use url::Url;

use crate::error::StreamError;
use crate::source::{StatsSource, StatsStream};
use crate::types::StatsRecord;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const DEFAULT_URL: &str = "ws://127.0.0.1:3000";

/// Connect to the agent. wss:// endpoints are checked against `tls_ca` when given, otherwise
/// against the bundled public roots.
pub async fn connect(url: &Url, tls_ca: Option<&Path>) -> Result<WsStream, tungstenite::Error> {
    let ws = if url.scheme() == "wss" {
        let cfg = client_config(tls_ca).map_err(|e| {
            tungstenite::Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;
        let connector = Connector::Rustls(Arc::new(cfg));
        connect_async_tls_with_config(url.as_str(), None, false, Some(connector))
            .await?
            .0
    } else {
        connect_async(url.as_str()).await?.0
    };
    Ok(ws)
}

fn root_store(tls_ca: Option<&Path>) -> anyhow::Result<rustls::RootCertStore> {
    let mut roots = rustls::RootCertStore::empty();
    let Some(ca) = tls_ca else {
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        return Ok(roots);
    };
    let mut reader = BufReader::new(File::open(ca)?);
    for cert in rustls_pemfile::certs(&mut reader) {
        roots.add(cert?)?;
    }
    if roots.is_empty() {
        anyhow::bail!("no certificates found in {}", ca.display());
    }
    Ok(roots)
}

fn client_config(tls_ca: Option<&Path>) -> anyhow::Result<rustls::ClientConfig> {
    Ok(rustls::ClientConfig::builder()
        .with_root_certificates(root_store(tls_ca)?)
        .with_no_client_auth())
}

/// Endpoint of `name`'s stats stream under the agent's base URL.
pub fn stats_url(base: &Url, name: &str, token: Option<&str>) -> Result<Url, StreamError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| StreamError::Connect(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(["containers", name, "stats"]);
    if let Some(t) = token {
        url.query_pairs_mut().append_pair("token", t);
    }
    Ok(url)
}

fn decode(bytes: &[u8]) -> Result<StatsRecord, StreamError> {
    Ok(serde_json::from_slice(bytes)?)
}

// Frames until the agent closes the socket
fn decode_frames(ws: WsStream) -> StatsStream {
    stream::unfold(ws, |mut ws| async move {
        loop {
            match ws.next().await? {
                Ok(Message::Text(text)) => return Some((decode(text.as_bytes()), ws)),
                Ok(Message::Binary(bytes)) => return Some((decode(&bytes), ws)),
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some((Err(StreamError::Transport(e.to_string())), ws)),
            }
        }
    })
    .boxed()
}

fn connect_error(name: &str, err: tungstenite::Error) -> StreamError {
    match err {
        tungstenite::Error::Http(resp) if resp.status() == StatusCode::NOT_FOUND => {
            StreamError::NotFound(name.to_string())
        }
        tungstenite::Error::Http(resp) => {
            StreamError::Connect(format!("agent replied {}", resp.status()))
        }
        other => StreamError::Connect(other.to_string()),
    }
}

/// Stats streams served by a stattop agent.
#[derive(Debug, Clone)]
pub struct WsSource {
    base: Url,
    tls_ca: Option<PathBuf>,
    token: Option<String>,
}

impl WsSource {
    pub fn new(base: Url, tls_ca: Option<PathBuf>, token: Option<String>) -> Self {
        Self { base, tls_ca, token }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

impl StatsSource for WsSource {
    fn open<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<StatsStream, StreamError>> {
        Box::pin(async move {
            let url = stats_url(&self.base, name, self.token.as_deref())?;
            debug!(container = name, %url, "connecting");
            let ws = connect(&url, self.tls_ca.as_deref())
                .await
                .map_err(|e| connect_error(name, e))?;
            Ok(decode_frames(ws))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_url_appends_segments() {
        let base = Url::parse("ws://127.0.0.1:3000").unwrap();
        let url = stats_url(&base, "web", None).unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:3000/containers/web/stats");

        let base = Url::parse("wss://host/agent/").unwrap();
        let url = stats_url(&base, "db 1", Some("s3cret")).unwrap();
        assert_eq!(
            url.as_str(),
            "wss://host/agent/containers/db%201/stats?token=s3cret"
        );
    }

    #[test]
    fn stats_url_rejects_opaque_base() {
        let base = Url::parse("mailto:ops@example.com").unwrap();
        assert!(matches!(
            stats_url(&base, "web", None),
            Err(StreamError::Connect(_))
        ));
    }

    #[test]
    fn bad_frame_is_a_decode_error() {
        assert!(matches!(decode(b"{not json"), Err(StreamError::Decode(_))));
        let rec = decode(br#"{"memory_stats":{"usage":5,"limit":10}}"#).unwrap();
        assert_eq!(rec.memory_stats.usage, 5);
    }

    #[test]
    fn wss_without_ca_uses_public_roots() {
        let roots = root_store(None).unwrap();
        assert!(!roots.is_empty());
        assert!(client_config(None).is_ok());
    }

    #[test]
    fn ca_file_without_certificates_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let pem = dir.path().join("ca.pem");
        std::fs::write(&pem, "not a certificate\n").unwrap();
        let err = root_store(Some(&pem)).unwrap_err();
        assert!(err.to_string().contains("no certificates found"), "{err}");
        assert!(root_store(Some(&dir.path().join("missing.pem"))).is_err());
    }

    #[tokio::test]
    async fn wss_to_plain_listener_fails_handshake() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            if let Ok((mut tcp, _)) = listener.accept().await {
                let _ = tcp.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n").await;
            }
        });
        let source = WsSource::new(Url::parse(&format!("wss://{addr}")).unwrap(), None, None);
        assert!(matches!(source.open("web").await, Err(StreamError::Connect(_))));
    }

    #[tokio::test]
    async fn unreachable_agent_is_a_connect_error() {
        // port 9 (discard) is closed on any sane test host
        let source = WsSource::new(Url::parse("ws://127.0.0.1:9").unwrap(), None, None);
        match source.open("web").await {
            Err(StreamError::Connect(_)) => {}
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("connected to a closed port"),
        }
    }
}
