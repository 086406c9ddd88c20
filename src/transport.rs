//! Byte-pipe transport: plain TCP or TLS.
//!
//! The link core is agnostic to what carries its octets; this module
//! yields something `AsyncRead + AsyncWrite` either way. TLS material is
//! PEM on disk, loaded with rustls-pemfile; verification follows the
//! configured peer-verify mode.

use std::fs::File;
use std::io::{self, BufReader};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::{client::TlsStream, TlsConnector};
use tracing::{debug, warn};

use crate::config::{PeerVerifyMode, TlsSettings};
use crate::error::{Iec104Error, Result};

/// Established byte pipe toward the controlled station.
pub enum Transport {
    /// Plain TCP
    Plain(TcpStream),
    /// TLS over TCP
    Tls(Box<TlsStream<TcpStream>>),
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("Transport::Plain"),
            Self::Tls(_) => f.write_str("Transport::Tls"),
        }
    }
}

impl Transport {
    /// Connect to `host:port`, optionally completing a TLS handshake.
    pub async fn connect(
        host: &str,
        port: u16,
        tls: Option<&TlsSettings>,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let stream = timeout(connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| Iec104Error::ConnectionTimeout)??;
        stream.set_nodelay(true).ok();

        match tls {
            None => {
                debug!(host, port, "plain TCP connection established");
                Ok(Self::Plain(stream))
            }
            Some(settings) => {
                let config = build_tls_config(settings)?;
                let server_name = ServerName::try_from(host.to_string())
                    .map_err(|_| Iec104Error::tls(format!("bad server name {host:?}")))?;
                let connected = timeout(
                    connect_timeout,
                    TlsConnector::from(config).connect(server_name, stream),
                )
                .await
                .map_err(|_| Iec104Error::ConnectionTimeout)?
                .map_err(|err| Iec104Error::tls(format!("handshake failed: {err}")))?;
                debug!(host, port, "TLS connection established");
                Ok(Self::Tls(Box::new(connected)))
            }
        }
    }
}

impl AsyncRead for Transport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Transport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Build a rustls client configuration from the TLS settings.
pub fn build_tls_config(settings: &TlsSettings) -> Result<Arc<rustls::ClientConfig>> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let builder = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])
        .map_err(|err| Iec104Error::tls(format!("protocol versions: {err}")))?;

    let builder = match settings.peer_verify {
        PeerVerifyMode::Strict => {
            let mut roots = RootCertStore::empty();
            let path = settings.ca_cert_path.as_deref().ok_or_else(|| {
                Iec104Error::tls("strict peer verification needs ca_cert_path")
            })?;
            for cert in load_certs(path)? {
                roots
                    .add(cert)
                    .map_err(|err| Iec104Error::tls(format!("CA bundle {path}: {err}")))?;
            }
            builder.with_root_certificates(roots)
        }
        mode @ (PeerVerifyMode::Off | PeerVerifyMode::Query) => {
            if mode == PeerVerifyMode::Query {
                warn!("peer_verify=query: certificate problems are logged, not enforced");
            }
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoVerification(provider)))
        }
    };

    let config = match (&settings.local_cert_path, &settings.private_key_path) {
        (Some(cert_path), Some(key_path)) => builder
            .with_client_auth_cert(load_certs(cert_path)?, load_key(key_path)?)
            .map_err(|err| Iec104Error::tls(format!("client certificate: {err}")))?,
        (None, None) => builder.with_no_client_auth(),
        _ => {
            return Err(Iec104Error::tls(
                "local_cert_path and private_key_path must be set together",
            ))
        }
    };

    Ok(Arc::new(config))
}

fn load_certs(path: &str) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .map_err(|err| Iec104Error::tls(format!("cannot open {path}: {err}")))?;
    let certs: Vec<_> = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<io::Result<_>>()
        .map_err(|err| Iec104Error::tls(format!("bad PEM in {path}: {err}")))?;
    if certs.is_empty() {
        return Err(Iec104Error::tls(format!("no certificates in {path}")));
    }
    Ok(certs)
}

fn load_key(path: &str) -> Result<PrivateKeyDer<'static>> {
    let file = File::open(path)
        .map_err(|err| Iec104Error::tls(format!("cannot open {path}: {err}")))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|err| Iec104Error::tls(format!("bad PEM in {path}: {err}")))?
        .ok_or_else(|| Iec104Error::tls(format!("no private key in {path}")))
}

/// Verifier for `peer_verify` off/query: accepts every certificate while
/// still checking handshake signatures with the provider's algorithms.
#[derive(Debug)]
struct NoVerification(Arc<rustls::crypto::CryptoProvider>);

impl ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plain_connect() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });

        let transport =
            Transport::connect("127.0.0.1", port, None, Duration::from_secs(2))
                .await
                .unwrap();
        assert!(matches!(transport, Transport::Plain(_)));
        accept.await.unwrap();
    }

    #[tokio::test]
    async fn connect_timeout_surfaces() {
        // 192.0.2.0/24 is TEST-NET-1; nothing answers
        let err = Transport::connect("192.0.2.1", 2404, None, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Iec104Error::ConnectionTimeout | Iec104Error::Io(_)
        ));
    }

    #[test]
    fn verify_off_builds_without_ca() {
        let settings = TlsSettings {
            peer_verify: PeerVerifyMode::Off,
            ..TlsSettings::default()
        };
        assert!(build_tls_config(&settings).is_ok());
    }

    #[test]
    fn verify_query_builds_without_ca() {
        // query completes the handshake and only logs problems, so no CA
        // bundle is required either
        let settings = TlsSettings {
            peer_verify: PeerVerifyMode::Query,
            ..TlsSettings::default()
        };
        assert!(build_tls_config(&settings).is_ok());
    }

    #[test]
    fn strict_without_ca_is_rejected() {
        let settings = TlsSettings {
            peer_verify: PeerVerifyMode::Strict,
            ..TlsSettings::default()
        };
        assert!(build_tls_config(&settings).is_err());
    }

    #[test]
    fn missing_ca_file_is_reported() {
        let settings = TlsSettings {
            ca_cert_path: Some("/nonexistent/ca.pem".into()),
            peer_verify: PeerVerifyMode::Strict,
            ..TlsSettings::default()
        };
        let err = build_tls_config(&settings).unwrap_err();
        assert!(matches!(err, Iec104Error::Tls(_)));
    }

    #[test]
    fn half_configured_client_auth_is_rejected() {
        let settings = TlsSettings {
            local_cert_path: Some("/tmp/cert.pem".into()),
            private_key_path: None,
            peer_verify: PeerVerifyMode::Off,
            ..TlsSettings::default()
        };
        assert!(build_tls_config(&settings).is_err());
    }
}
