//! Station configuration.

use std::time::Duration;

use serde::Deserialize;

/// Default IEC 104 TCP port.
pub const DEFAULT_PORT: u16 = 2404;

/// Default t1 in seconds (STARTDT, TESTFR and command confirmation window).
pub const DEFAULT_T1: u16 = 15;

/// Default t2 in seconds (supervisory idle).
pub const DEFAULT_T2: u16 = 10;

/// Default t3 in seconds (test frame idle).
pub const DEFAULT_T3: u16 = 20;

/// Default k (max outstanding I-frames).
pub const DEFAULT_K: u16 = 12;

/// Default w (received I-frames before a forced S-frame).
pub const DEFAULT_W: u16 = 8;

/// Default general interrogation period in seconds.
pub const DEFAULT_GI_PERIOD: u16 = 330;

/// Default retry delay for an unanswered general interrogation, seconds.
pub const DEFAULT_GI_RETRY: u16 = 45;

/// Peer certificate verification mode for the TLS transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerVerifyMode {
    /// Accept any certificate
    Off,
    /// Complete the handshake regardless, log verification problems
    Query,
    /// Require a chain to the configured CA bundle
    #[default]
    Strict,
}

/// TLS transport settings; present only when TLS is enabled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsSettings {
    /// Path to the peer CA bundle (PEM)
    pub ca_cert_path: Option<String>,
    /// Path to the local certificate chain (PEM)
    pub local_cert_path: Option<String>,
    /// Path to the local private key (PEM, RSA or PKCS#8)
    pub private_key_path: Option<String>,
    /// Peer verification mode
    #[serde(default)]
    pub peer_verify: PeerVerifyMode,
}

/// Controlling-station configuration.
///
/// All timer values are whole seconds, matching the 1 Hz protocol tick.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Controlled station address
    pub peer_ip: String,
    /// Alternate address tried on every other reconnect attempt
    pub peer_ip_backup: Option<String>,
    /// TCP port
    pub port: u16,
    /// Common address the peer is expected to use
    pub ca_of_asdu: u16,
    /// Originator address written into outgoing ASDUs
    pub originator_address: u8,
    /// Default common address for commands whose object carries CA 0
    pub common_address_cmd: u16,
    /// t1: STARTDT/TESTFR/unacknowledged-I-frame confirmation window
    pub t1: u16,
    /// t2: supervisory idle; the countdown runs at a 500 ms cadence, so
    /// the effective delay is half this value
    pub t2: u16,
    /// t3: test frame idle
    pub t3: u16,
    /// k: max outstanding unacknowledged I-frames
    pub k: u16,
    /// w: received I-frames that force an immediate S-frame
    pub w: u16,
    /// Seconds between periodic general interrogations
    pub gi_period: u16,
    /// Retry delay for a general interrogation that got no ACT-CON
    pub gi_retry_time: u16,
    /// Disconnect on receive-sequence mismatch
    pub strict_sequence_order: bool,
    /// Acknowledge with timed S-frames; when off, every I-frame is
    /// acknowledged immediately
    pub supervisory_enabled: bool,
    /// TCP connect timeout in seconds
    pub connect_timeout: u16,
    /// TLS settings; `None` runs plain TCP
    pub tls: Option<TlsSettings>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            peer_ip: String::from("127.0.0.1"),
            peer_ip_backup: None,
            port: DEFAULT_PORT,
            ca_of_asdu: 1,
            originator_address: 0,
            common_address_cmd: 1,
            t1: DEFAULT_T1,
            t2: DEFAULT_T2,
            t3: DEFAULT_T3,
            k: DEFAULT_K,
            w: DEFAULT_W,
            gi_period: DEFAULT_GI_PERIOD,
            gi_retry_time: DEFAULT_GI_RETRY,
            strict_sequence_order: true,
            supervisory_enabled: true,
            connect_timeout: 10,
            tls: None,
        }
    }
}

impl ClientConfig {
    /// Configuration for a peer address, defaults everywhere else.
    pub fn new(peer_ip: impl Into<String>) -> Self {
        Self {
            peer_ip: peer_ip.into(),
            ..Self::default()
        }
    }

    /// Set the backup peer address.
    pub fn peer_ip_backup(mut self, ip: impl Into<String>) -> Self {
        self.peer_ip_backup = Some(ip.into());
        self
    }

    /// Set the TCP port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the expected common address and the command default together.
    pub fn common_address(mut self, ca: u16) -> Self {
        self.ca_of_asdu = ca;
        self.common_address_cmd = ca;
        self
    }

    /// Set the originator address.
    pub fn originator_address(mut self, oa: u8) -> Self {
        self.originator_address = oa;
        self
    }

    /// Set t1 in seconds.
    pub fn t1(mut self, seconds: u16) -> Self {
        self.t1 = seconds;
        self
    }

    /// Set t2 in seconds.
    pub fn t2(mut self, seconds: u16) -> Self {
        self.t2 = seconds;
        self
    }

    /// Set t3 in seconds.
    pub fn t3(mut self, seconds: u16) -> Self {
        self.t3 = seconds;
        self
    }

    /// Set the k window.
    pub fn k(mut self, k: u16) -> Self {
        self.k = k;
        self
    }

    /// Set the w window.
    pub fn w(mut self, w: u16) -> Self {
        self.w = w;
        self
    }

    /// Set the general interrogation period in seconds.
    pub fn gi_period(mut self, seconds: u16) -> Self {
        self.gi_period = seconds;
        self
    }

    /// Set the general interrogation retry delay in seconds.
    pub fn gi_retry_time(mut self, seconds: u16) -> Self {
        self.gi_retry_time = seconds;
        self
    }

    /// Relax receive-sequence checking to trace-and-accept.
    pub fn relaxed_sequence_order(mut self) -> Self {
        self.strict_sequence_order = false;
        self
    }

    /// Enable TLS with the given settings.
    pub fn tls(mut self, settings: TlsSettings) -> Self {
        self.tls = Some(settings);
        self
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout as u64)
    }
}
