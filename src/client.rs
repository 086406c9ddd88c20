//! Asynchronous controlling-station client.
//!
//! Owns the socket and serializes the three entry points (the 1 Hz tick,
//! inbound frames and caller requests) onto whichever task drives
//! [`Iec104Client::poll`]. All protocol decisions live in [`Link`]; this
//! shell applies its actions and shuttles events to the subscriber.

use std::borrow::Cow;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::codec::{Apdu, Iec104Codec};
use crate::config::ClientConfig;
use crate::error::{Iec104Error, Result};
use crate::link::{Action, Iec104Event, Link, LinkState};
use crate::trace::{TraceSink, Tracer};
use crate::transport::Transport;
use crate::types::ObjectValue;

/// Event channel depth.
const EVENT_QUEUE: usize = 100;

/// Reconnect is attempted every this many idle ticks.
const RECONNECT_TICKS: u32 = 5;

/// IEC 60870-5-104 controlling station.
pub struct Iec104Client {
    config: ClientConfig,
    link: Link,
    tracer: Tracer,
    framed: Option<Framed<Transport, Iec104Codec>>,
    event_tx: mpsc::Sender<Iec104Event>,
    event_rx: Option<mpsc::Receiver<Iec104Event>>,
    tick: Interval,
    connect_attempts: u32,
    idle_ticks: u32,
    allow_connect: bool,
    ending: bool,
}

impl Iec104Client {
    /// Client for a configuration, tracing disabled.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_tracer(config, Tracer::disabled())
    }

    /// Client that writes protocol traces through `sink`.
    pub fn with_trace_sink(config: ClientConfig, sink: std::sync::Arc<dyn TraceSink>) -> Self {
        Self::with_tracer(config, Tracer::new(sink))
    }

    fn with_tracer(config: ClientConfig, tracer: Tracer) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE);
        let period = Duration::from_secs(1);
        let mut tick = interval_at(Instant::now() + period, period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let link = Link::new(config.clone(), tracer.clone());
        Self {
            config,
            link,
            tracer,
            framed: None,
            event_tx,
            event_rx: Some(event_rx),
            tick,
            connect_attempts: 0,
            idle_ticks: 0,
            allow_connect: true,
            ending: false,
        }
    }

    /// Take the event receiver. Only the first call yields it.
    pub fn subscribe(&mut self) -> Option<mpsc::Receiver<Iec104Event>> {
        self.event_rx.take()
    }

    /// Current link state.
    pub fn state(&self) -> LinkState {
        self.link.state()
    }

    /// Objects received with interrogation causes in the running cycle.
    pub fn gi_object_count(&self) -> u32 {
        self.link.gi_object_count()
    }

    /// Allow automatic reconnects (the default).
    pub fn enable_connect(&mut self) {
        self.allow_connect = true;
    }

    /// Forbid connecting and drop an established connection.
    pub async fn disable_connect(&mut self) {
        self.allow_connect = false;
        if self.framed.is_some() {
            self.drop_connection().await;
        }
    }

    /// Connect to the peer, alternating between the primary and backup
    /// address on successive attempts.
    pub async fn connect(&mut self) -> Result<()> {
        if self.ending || !self.allow_connect {
            return Err(Iec104Error::Connection(Cow::Borrowed(
                "connecting is disabled",
            )));
        }
        if self.framed.is_some() {
            return Err(Iec104Error::Connection(Cow::Borrowed("already connected")));
        }

        self.connect_attempts = self.connect_attempts.wrapping_add(1);
        let host = self.pick_peer().to_string();
        debug!(%host, port = self.config.port, attempt = self.connect_attempts, "connecting");

        let transport = Transport::connect(
            &host,
            self.config.port,
            self.config.tls.as_ref(),
            self.config.connect_timeout_duration(),
        )
        .await?;

        self.framed = Some(Framed::new(
            transport,
            Iec104Codec::with_tracer(self.tracer.clone()),
        ));
        self.emit(Iec104Event::Connected).await;

        let actions = self.link.on_transport_up();
        self.apply(actions).await
    }

    /// Drop the connection; automatic reconnect resumes from `poll`.
    pub async fn disconnect(&mut self) {
        if self.framed.is_some() {
            self.drop_connection().await;
        }
    }

    /// Final teardown: no further I/O happens after this returns.
    pub fn terminate(&mut self) {
        self.ending = true;
        self.framed = None;
        self.link.on_transport_down();
    }

    /// Drive the protocol one step: waits for the next tick or inbound
    /// frame, whichever comes first, and applies the link's response.
    /// Call in a loop.
    pub async fn poll(&mut self) -> Result<()> {
        if self.framed.is_none() {
            self.tick.tick().await;
            self.idle_ticks = self.idle_ticks.wrapping_add(1);
            if !self.ending && self.allow_connect && self.idle_ticks % RECONNECT_TICKS == 0 {
                if let Err(err) = self.connect().await {
                    warn!(%err, "reconnect attempt failed");
                }
            }
            return Ok(());
        }

        enum Step {
            Tick,
            Frame(Option<std::result::Result<Apdu, Iec104Error>>),
        }

        let step = match self.framed.as_mut() {
            Some(framed) => {
                tokio::select! {
                    _ = self.tick.tick() => Step::Tick,
                    frame = framed.next() => Step::Frame(frame),
                }
            }
            None => return Ok(()),
        };

        match step {
            Step::Tick => {
                let actions = self.link.on_tick();
                self.apply(actions).await
            }
            Step::Frame(Some(Ok(apdu))) => {
                let actions = self.link.on_apdu(&apdu);
                self.apply(actions).await
            }
            Step::Frame(Some(Err(err))) => {
                warn!(%err, "transport error");
                self.drop_connection().await;
                Ok(())
            }
            Step::Frame(None) => {
                info!("peer closed the connection");
                self.drop_connection().await;
                Ok(())
            }
        }
    }

    // ---- application requests ------------------------------------------

    /// Solicit a general interrogation for a group (20 = station).
    pub async fn solicit_gi(&mut self, group: u8) -> Result<()> {
        let actions = self.link.solicit_gi(group)?;
        self.apply(actions).await
    }

    /// Station-wide general interrogation.
    pub async fn general_interrogation(&mut self) -> Result<()> {
        self.solicit_gi(crate::link::GI_GROUP_STATION).await
    }

    /// Send a command or parameter object with cause ACTIVATION. A zero
    /// common address uses the configured default; timed objects carrying
    /// a zero tag are stamped with local time.
    pub async fn send_command(
        &mut self,
        common_address: u16,
        ioa: u32,
        value: ObjectValue,
    ) -> Result<()> {
        let actions = self.link.send_command(common_address, ioa, value)?;
        self.apply(actions).await
    }

    /// Send a test command carrying the running test sequence counter.
    pub async fn send_test_command(&mut self) -> Result<()> {
        let actions = self.link.send_test_command()?;
        self.apply(actions).await
    }

    /// Synchronize the peer's clock to local time.
    pub async fn send_clock_sync(&mut self, common_address: u16) -> Result<()> {
        let actions = self.link.send_clock_sync(common_address)?;
        self.apply(actions).await
    }

    /// Counter interrogation (C_CI_NA_1).
    pub async fn counter_interrogation(
        &mut self,
        common_address: u16,
        request: u8,
        freeze: u8,
    ) -> Result<()> {
        let actions = self
            .link
            .solicit_counter_interrogation(common_address, request, freeze)?;
        self.apply(actions).await
    }

    /// Read command for one object (C_RD_NA_1).
    pub async fn read_command(&mut self, common_address: u16, ioa: u32) -> Result<()> {
        let actions = self.link.send_read_command(common_address, ioa)?;
        self.apply(actions).await
    }

    /// Reset process command (C_RP_NA_1).
    pub async fn reset_process(&mut self, common_address: u16, qualifier: u8) -> Result<()> {
        let actions = self.link.send_reset_process(common_address, qualifier)?;
        self.apply(actions).await
    }

    // ---- internals -----------------------------------------------------

    fn pick_peer(&self) -> &str {
        match &self.config.peer_ip_backup {
            Some(backup) if self.connect_attempts % 2 == 0 => backup,
            _ => &self.config.peer_ip,
        }
    }

    async fn emit(&self, event: Iec104Event) {
        let _ = self.event_tx.send(event).await;
    }

    async fn drop_connection(&mut self) {
        self.framed = None;
        self.link.on_transport_down();
        self.emit(Iec104Event::Disconnected).await;
    }

    async fn apply(&mut self, actions: Vec<Action>) -> Result<()> {
        for action in actions {
            match action {
                Action::Send(apdu) => {
                    if self.ending {
                        continue;
                    }
                    let Some(framed) = self.framed.as_mut() else {
                        continue;
                    };
                    match framed.send(apdu).await {
                        Ok(()) => {}
                        Err(err) if err.is_fatal() => {
                            warn!(%err, "write failed");
                            self.drop_connection().await;
                            return Ok(());
                        }
                        // EncodeOverflow and friends go back to the caller
                        Err(err) => return Err(err),
                    }
                }
                Action::Indicate(event) => self.emit(event).await,
                Action::Disconnect(reason) => {
                    warn!(reason, "link requested disconnect");
                    self.drop_connection().await;
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}
