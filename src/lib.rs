//! # iec104_station
//!
//! IEC 60870-5-104 controlling station (SCADA master) for Rust.
//!
//! The crate speaks the 104 telecontrol protocol toward substation RTUs:
//! APDU framing over TCP (optionally TLS), the numbered I/S/U control
//! procedure with t1/t2/t3 timers and k/w windows, periodic general
//! interrogation with retry, clock sync and test commands, and bit-exact
//! encoding of the common type identifications including CP56Time2a time
//! tags and quality descriptors.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use iec104_station::{ClientConfig, Iec104Client, Iec104Event, ObjectValue};
//!
//! #[tokio::main]
//! async fn main() -> iec104_station::Result<()> {
//!     let config = ClientConfig::new("192.168.1.100").common_address(1);
//!     let mut client = Iec104Client::new(config);
//!     let mut events = client.subscribe().expect("first subscriber");
//!
//!     client.connect().await?;
//!
//!     tokio::spawn(async move {
//!         while let Some(event) = events.recv().await {
//!             match event {
//!                 Iec104Event::DataIndication(asdu) => println!("{asdu:?}"),
//!                 other => println!("{other:?}"),
//!             }
//!         }
//!     });
//!
//!     loop {
//!         client.poll().await?;
//!     }
//! }
//! ```
//!
//! ## Layers
//!
//! - [`codec`]: APDU framing: start octet, length, four control octets
//! - [`types`]: APCI, TypeID/COT vocabularies, CP56Time2a, object bodies
//! - [`parser`]: ASDU payload to information objects, SQ expansion
//! - [`link`]: sans-I/O state machine: VS/VR, timers, GI lifecycle
//! - [`client`]: tokio shell: socket, reconnect alternation, event channel
//! - [`trace`]: one-line-per-APDU protocol traces through an opaque sink
//!
//! The link layer is driven entirely by value: frames in, actions out.
//! Everything time-based runs off a 1 Hz tick, so tests exercise timer
//! behavior without waiting on wall clocks.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod link;
pub mod parser;
pub mod trace;
pub mod transport;
pub mod types;

pub use client::Iec104Client;
pub use codec::{Apdu, Iec104Codec};
pub use config::{ClientConfig, PeerVerifyMode, TlsSettings};
pub use error::{Iec104Error, Result};
pub use link::{Action, Iec104Event, Link, LinkState};
pub use parser::parse_asdu;
pub use trace::{TraceSink, Tracer};
pub use transport::Transport;
pub use types::*;
