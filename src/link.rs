//! Link-layer state machine and application procedures.
//!
//! [`Link`] is pure: inputs are decoded APDUs, 1 Hz ticks and caller
//! requests; outputs are ordered [`Action`] lists the owning client
//! applies (write a frame, raise an event, tear the connection down).
//! Sequence counters VS/VR are kept in wire form, even 16-bit words with
//! bit 0 reserved for the I-frame discriminator, so they advance by 2
//! per frame and wrap with the u16.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::codec::Apdu;
use crate::config::ClientConfig;
use crate::error::{Iec104Error, Result};
use crate::parser::parse_asdu;
use crate::trace::{unknown_type_line, Tracer};
use crate::types::{
    Asdu, Cot, Cp56Time2a, ObjectValue, TypeId, UFunction, MAX_APDU_LENGTH,
};

/// Seconds between STARTDT confirmation and the initial general
/// interrogation.
const INITIAL_GI_DELAY: i32 = 15;

/// Station interrogation group (QOI 20).
pub const GI_GROUP_STATION: u8 = 20;

/// Link connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No transport
    Disconnected,
    /// Transport up, STARTDT not yet confirmed
    Connected,
    /// STARTDT confirmed, I-frames flowing
    DataActive,
}

/// Events surfaced to the host application.
#[derive(Debug, Clone, PartialEq)]
pub enum Iec104Event {
    /// Transport established
    Connected,
    /// Transport lost
    Disconnected,
    /// STARTDT confirmed; monitor traffic may now arrive
    DataTransferStarted,
    /// Decoded monitor ASDU
    DataIndication(Asdu),
    /// Command or parameter echo (ACT-CON / ACT-TERM, P/N in the header)
    CommandActResp(Asdu),
    /// General interrogation confirmed by the peer
    InterrogationActConf,
    /// General interrogation terminated; total objects received with
    /// interrogation causes since the ACT-CON
    InterrogationActTerm {
        /// Accumulated object count
        objects: u32,
    },
    /// Peer finished (re-)initialization
    EndOfInit(Asdu),
}

/// One step of the link's response to an input. The owner applies the
/// actions of a batch strictly in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Write this frame to the transport
    Send(Apdu),
    /// Raise this event to the host
    Indicate(Iec104Event),
    /// Tear the connection down; the reason is for diagnostics only
    Disconnect(&'static str),
}

/// Clock source for stamping outgoing time tags; injectable for tests.
type Clock = Box<dyn Fn() -> Cp56Time2a + Send>;

/// Controlling-station link state machine.
pub struct Link {
    cfg: ClientConfig,
    tracer: Tracer,
    clock: Clock,

    state: LinkState,
    /// Send state, wire form (even)
    vs: u16,
    /// Receive state, wire form (even)
    vr: u16,
    /// Peer-acknowledged send state, wire form
    acked_vs: u16,
    tx_enabled: bool,
    first_iframe_seen: bool,
    startdt_retried: bool,
    /// Received I-frames not yet acknowledged, counts toward w
    unacked_recv: u16,

    // countdowns in seconds; -1 disarmed
    t_startdt: i32,
    t_supervisory: i32,
    t_testfr: i32,
    t_testfr_con: i32,
    t_gi: i32,
    t_ack: i32,

    gi_object_count: u32,
    test_command_count: u16,
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("state", &self.state)
            .field("vs", &self.vs)
            .field("vr", &self.vr)
            .field("tx_enabled", &self.tx_enabled)
            .finish()
    }
}

impl Link {
    /// Link for a configuration, wall-clock time stamps.
    pub fn new(cfg: ClientConfig, tracer: Tracer) -> Self {
        Self::with_clock(cfg, tracer, Box::new(Cp56Time2a::now_local))
    }

    /// Link with an injected clock.
    pub fn with_clock(cfg: ClientConfig, tracer: Tracer, clock: Clock) -> Self {
        Self {
            cfg,
            tracer,
            clock,
            state: LinkState::Disconnected,
            vs: 0,
            vr: 0,
            acked_vs: 0,
            tx_enabled: false,
            first_iframe_seen: false,
            startdt_retried: false,
            unacked_recv: 0,
            t_startdt: -1,
            t_supervisory: -1,
            t_testfr: -1,
            t_testfr_con: -1,
            t_gi: -1,
            t_ack: -1,
            gi_object_count: 0,
            test_command_count: 0,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Whether I-frames may be sent (STARTDT confirmed).
    pub fn tx_enabled(&self) -> bool {
        self.tx_enabled
    }

    /// Receive state counter, wire form.
    pub fn vr(&self) -> u16 {
        self.vr
    }

    /// Send state counter, wire form.
    pub fn vs(&self) -> u16 {
        self.vs
    }

    /// Objects received with interrogation causes since the last ACT-CON.
    pub fn gi_object_count(&self) -> u32 {
        self.gi_object_count
    }

    /// Unacknowledged I-frames in flight.
    pub fn outstanding(&self) -> u16 {
        self.vs.wrapping_sub(self.acked_vs) >> 1
    }

    // ---- transport lifecycle -------------------------------------------

    /// Transport came up: reset counters and open the STARTDT procedure.
    pub fn on_transport_up(&mut self) -> Vec<Action> {
        self.state = LinkState::Connected;
        self.vs = 0;
        self.vr = 0;
        self.acked_vs = 0;
        self.tx_enabled = false;
        self.first_iframe_seen = false;
        self.startdt_retried = false;
        self.unacked_recv = 0;
        self.gi_object_count = 0;
        self.test_command_count = 0;
        self.t_supervisory = -1;
        self.t_testfr = -1;
        self.t_testfr_con = -1;
        self.t_gi = -1;
        self.t_ack = -1;

        self.tracer.message("*** TCP CONNECT!");
        let mut actions = Vec::new();
        self.send_u(&mut actions, UFunction::StartDtAct);
        self.t_startdt = self.cfg.t1 as i32;
        actions
    }

    /// Transport went down: disarm everything.
    pub fn on_transport_down(&mut self) {
        self.state = LinkState::Disconnected;
        self.tx_enabled = false;
        self.t_startdt = -1;
        self.t_supervisory = -1;
        self.t_testfr = -1;
        self.t_testfr_con = -1;
        self.t_gi = -1;
        self.t_ack = -1;
        self.tracer.message("*** TCP DISCONNECT!");
    }

    // ---- timers --------------------------------------------------------

    /// One-second tick: run every countdown in protocol order.
    pub fn on_tick(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.state == LinkState::Disconnected {
            return actions;
        }

        // STARTDT confirmation window: one retransmit, then give up
        if self.t_startdt > 0 {
            self.t_startdt -= 1;
            if self.t_startdt == 0 {
                if self.startdt_retried {
                    return self.fail(actions, "STARTDT unanswered after retry");
                }
                self.startdt_retried = true;
                self.send_u(&mut actions, UFunction::StartDtAct);
                self.t_startdt = self.cfg.t1 as i32;
            }
        }

        // general interrogation schedule
        if self.t_gi > 0 {
            self.t_gi -= 1;
            if self.t_gi == 0 {
                if let Err(err) = self.push_gi(&mut actions, GI_GROUP_STATION) {
                    warn!(%err, "scheduled interrogation not sent");
                }
            }
        }

        // supervisory runs at a 500 ms cadence: two decrements per tick
        if self.cfg.supervisory_enabled {
            for _ in 0..2 {
                if self.t_supervisory > 0 {
                    self.t_supervisory -= 1;
                }
            }
            if self.t_supervisory == 0 {
                self.t_supervisory = -1;
                self.send_supervisory(&mut actions);
            }
        }

        // idle probe, only while data transfer is active
        if self.tx_enabled && self.t_testfr > 0 {
            self.t_testfr -= 1;
            if self.t_testfr == 0 {
                self.send_u(&mut actions, UFunction::TestFrAct);
                self.t_testfr_con = self.cfg.t1 as i32;
            }
        }

        // TESTFR confirmation window
        if self.t_testfr_con > 0 {
            self.t_testfr_con -= 1;
            if self.t_testfr_con == 0 {
                return self.fail(actions, "TESTFR unanswered past t1");
            }
        }

        // oldest unacknowledged I-frame window
        if self.t_ack > 0 {
            self.t_ack -= 1;
            if self.t_ack == 0 {
                return self.fail(actions, "I-frames unacknowledged past t1");
            }
        }

        actions
    }

    // ---- inbound frames ------------------------------------------------

    /// Process one received APDU.
    pub fn on_apdu(&mut self, apdu: &Apdu) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.state == LinkState::Disconnected {
            return actions;
        }

        match apdu.apci {
            crate::types::Apci::UFrame { function } => {
                self.tracer.message(&format!("     {}", function.mnemonic()));
                self.on_u_frame(function, &mut actions);
            }
            crate::types::Apci::SFrame { recv_seq } => {
                self.tracer.message("     SUPERVISORY");
                self.acknowledge(recv_seq << 1);
            }
            crate::types::Apci::IFrame { send_seq, recv_seq } => {
                let vr_new = send_seq << 1;
                if vr_new != self.vr && !(vr_new == 2 && !self.first_iframe_seen) {
                    self.tracer
                        .message("*** SEQUENCE ERROR! **************************");
                    warn!(expected = self.vr, got = vr_new, "receive sequence mismatch");
                    if self.cfg.strict_sequence_order {
                        return self.fail(actions, "receive sequence error");
                    }
                }
                self.vr = vr_new.wrapping_add(2);
                self.first_iframe_seen = true;
                self.acknowledge(recv_seq << 1);
                self.t_testfr = self.cfg.t3 as i32;

                if self.cfg.supervisory_enabled {
                    if self.t_supervisory < 0 {
                        self.t_supervisory = self.cfg.t2 as i32;
                    }
                    self.unacked_recv += 1;
                    if self.unacked_recv >= self.cfg.w {
                        self.send_supervisory(&mut actions);
                    }
                } else {
                    self.send_supervisory(&mut actions);
                }

                self.handle_asdu(&apdu.payload, &mut actions);
            }
        }
        actions
    }

    fn on_u_frame(&mut self, function: UFunction, actions: &mut Vec<Action>) {
        match function {
            UFunction::StartDtAct => {
                // only a controlled station should see this, but answering
                // is harmless and keeps a confused peer alive
                self.send_u(actions, UFunction::StartDtCon);
            }
            UFunction::StartDtCon => {
                self.t_startdt = -1;
                self.startdt_retried = false;
                self.tx_enabled = true;
                self.state = LinkState::DataActive;
                self.t_gi = INITIAL_GI_DELAY;
                self.t_testfr = self.cfg.t3 as i32;
                actions.push(Action::Indicate(Iec104Event::DataTransferStarted));
            }
            UFunction::TestFrAct => self.send_u(actions, UFunction::TestFrCon),
            UFunction::TestFrCon => {
                self.t_testfr_con = -1;
                self.t_testfr = self.cfg.t3 as i32;
            }
            UFunction::StopDtAct | UFunction::StopDtCon => {}
        }
    }

    fn handle_asdu(&mut self, payload: &Bytes, actions: &mut Vec<Action>) {
        if payload.is_empty() {
            return;
        }
        let asdu = match parse_asdu(payload) {
            Ok(asdu) => asdu,
            Err(Iec104Error::UnknownTypeId(raw)) => {
                self.tracer.message(&unknown_type_line(raw));
                return;
            }
            Err(Iec104Error::UnknownCause(_)) => {
                self.tracer.message("     !!! TYPE NOT IMPLEMENTED");
                return;
            }
            Err(err) => {
                self.tracer.message(&format!("R--> ERROR: {err}"));
                debug!(%err, "dropping undecodable ASDU");
                return;
            }
        };

        self.tracer.asdu(&asdu);

        match asdu.header.type_id {
            TypeId::InterrogationCommand => {
                // any echo restarts the periodic schedule
                self.t_gi = self.cfg.gi_period as i32;
                match asdu.header.cot {
                    Cot::ActivationConfirm => {
                        self.gi_object_count = 0;
                        self.tracer.message("     INTERROGATION ACT CON");
                        actions.push(Action::Indicate(Iec104Event::InterrogationActConf));
                    }
                    Cot::ActivationTermination => {
                        self.tracer.message(&format!(
                            "     INTERROGATION ACT TERM, total objects: {}",
                            self.gi_object_count
                        ));
                        actions.push(Action::Indicate(Iec104Event::InterrogationActTerm {
                            objects: self.gi_object_count,
                        }));
                    }
                    _ => self.tracer.message("     INTERROGATION"),
                }
            }
            TypeId::TestCommandTime => {
                if asdu.header.cot == Cot::Activation {
                    let counter = match asdu.objects.first().map(|obj| &obj.value) {
                        Some(ObjectValue::TestCommand { counter, .. }) => *counter,
                        _ => 0,
                    };
                    let reply = Asdu::single(
                        Cot::ActivationConfirm,
                        self.cfg.originator_address,
                        asdu.header.common_address,
                        0,
                        ObjectValue::TestCommand {
                            counter,
                            time: (self.clock)(),
                        },
                    );
                    match self.push_i_frame(actions, &reply) {
                        Ok(()) => self.tracer.message("     TEST COMMAND CONF"),
                        Err(err) => warn!(%err, "test command confirmation not sent"),
                    }
                } else {
                    actions.push(Action::Indicate(Iec104Event::CommandActResp(asdu)));
                }
            }
            TypeId::EndOfInit => {
                self.tracer.message("R--> END OF INITIALIZATION");
                actions.push(Action::Indicate(Iec104Event::EndOfInit(asdu)));
            }
            ti if ti.is_monitor_process() => {
                if asdu.header.cot.is_interrogation_response() {
                    self.gi_object_count += asdu.objects.len() as u32;
                }
                actions.push(Action::Indicate(Iec104Event::DataIndication(asdu)));
            }
            ti if ti.is_command_like() => {
                actions.push(Action::Indicate(Iec104Event::CommandActResp(asdu)));
            }
            _ => {}
        }
    }

    // ---- caller requests -----------------------------------------------

    /// Solicit an interrogation for a group (20 = station). Arms the
    /// retry countdown; the periodic schedule resumes once the peer
    /// echoes the command.
    pub fn solicit_gi(&mut self, group: u8) -> Result<Vec<Action>> {
        self.ensure_tx()?;
        let mut actions = Vec::new();
        self.push_gi(&mut actions, group)?;
        Ok(actions)
    }

    /// Send a command or parameter object with cause ACTIVATION.
    ///
    /// A zero common address falls back to the configured command
    /// default. Timed variants carrying [`Cp56Time2a::ZERO`] are stamped
    /// with the local clock.
    pub fn send_command(
        &mut self,
        common_address: u16,
        ioa: u32,
        mut value: ObjectValue,
    ) -> Result<Vec<Action>> {
        self.ensure_tx()?;
        let ca = if common_address == 0 {
            self.cfg.common_address_cmd
        } else {
            common_address
        };
        if value.time_tag().is_some_and(Cp56Time2a::is_zero) {
            value.set_time_tag((self.clock)());
        }
        let type_id = value.type_id();
        let asdu = Asdu::single(Cot::Activation, self.cfg.originator_address, ca, ioa, value);

        let mut actions = Vec::new();
        self.push_i_frame(&mut actions, &asdu)?;
        self.tracer.message(&format!(
            "     {} COMMAND ADDRESS {ioa} CA {ca}",
            type_id.mnemonic()
        ));
        Ok(actions)
    }

    /// Send a test command with the running test sequence counter.
    pub fn send_test_command(&mut self) -> Result<Vec<Action>> {
        let counter = self.test_command_count;
        let actions = self.send_command(
            0,
            0,
            ObjectValue::TestCommand {
                counter,
                time: Cp56Time2a::ZERO,
            },
        )?;
        self.test_command_count = self.test_command_count.wrapping_add(1);
        Ok(actions)
    }

    /// Send a clock synchronization command stamped with local time.
    pub fn send_clock_sync(&mut self, common_address: u16) -> Result<Vec<Action>> {
        self.send_command(
            common_address,
            0,
            ObjectValue::ClockSync {
                time: Cp56Time2a::ZERO,
            },
        )
    }

    /// Send a counter interrogation command (C_CI_NA_1).
    pub fn solicit_counter_interrogation(
        &mut self,
        common_address: u16,
        request: u8,
        freeze: u8,
    ) -> Result<Vec<Action>> {
        self.send_command(
            common_address,
            0,
            ObjectValue::CounterInterrogation { request, freeze },
        )
    }

    /// Send a read command for one object address (C_RD_NA_1).
    pub fn send_read_command(&mut self, common_address: u16, ioa: u32) -> Result<Vec<Action>> {
        self.send_command(common_address, ioa, ObjectValue::Read)
    }

    /// Send a reset process command (C_RP_NA_1).
    pub fn send_reset_process(
        &mut self,
        common_address: u16,
        qualifier: u8,
    ) -> Result<Vec<Action>> {
        self.send_command(common_address, 0, ObjectValue::ResetProcess { qualifier })
    }

    // ---- internals -----------------------------------------------------

    fn ensure_tx(&self) -> Result<()> {
        if self.tx_enabled {
            Ok(())
        } else {
            Err(Iec104Error::NotConnected)
        }
    }

    fn send_u(&mut self, actions: &mut Vec<Action>, function: UFunction) {
        actions.push(Action::Send(Apdu::u_frame(function)));
        self.tracer.message(&format!("     {}", function.mnemonic()));
    }

    fn send_supervisory(&mut self, actions: &mut Vec<Action>) {
        actions.push(Action::Send(Apdu::s_frame(self.vr >> 1)));
        self.unacked_recv = 0;
        self.t_supervisory = -1;
        self.tracer
            .message(&format!("     SUPERVISORY {:x}", self.vr));
    }

    fn push_gi(&mut self, actions: &mut Vec<Action>, group: u8) -> Result<()> {
        let asdu = Asdu::single(
            Cot::Activation,
            self.cfg.originator_address,
            self.cfg.ca_of_asdu,
            0,
            ObjectValue::Interrogation { qualifier: group },
        );
        self.push_i_frame(actions, &asdu)?;
        if group == GI_GROUP_STATION {
            self.tracer.message("     GENERAL INTERROGATION");
        } else {
            self.tracer
                .message(&format!("     INTERROGATION GROUP {group}"));
        }
        self.t_gi = self.cfg.gi_retry_time as i32;
        Ok(())
    }

    fn push_i_frame(&mut self, actions: &mut Vec<Action>, asdu: &Asdu) -> Result<()> {
        if self.outstanding() >= self.cfg.k {
            return Err(Iec104Error::TooManyUnconfirmed(self.cfg.k));
        }
        let payload = asdu.encode();
        if payload.len() + 4 > MAX_APDU_LENGTH {
            return Err(Iec104Error::EncodeOverflow(payload.len()));
        }

        actions.push(Action::Send(Apdu::i_frame(
            self.vs >> 1,
            self.vr >> 1,
            payload,
        )));
        self.vs = self.vs.wrapping_add(2);
        if self.t_ack < 0 {
            self.t_ack = self.cfg.t1 as i32;
        }
        // the piggybacked NR acknowledges everything received so far
        self.unacked_recv = 0;
        self.t_supervisory = -1;
        Ok(())
    }

    fn acknowledge(&mut self, nr_wire: u16) {
        self.acked_vs = nr_wire;
        if self.acked_vs == self.vs {
            self.t_ack = -1;
        } else if self.t_ack < 0 {
            self.t_ack = self.cfg.t1 as i32;
        }
    }

    fn fail(&mut self, mut actions: Vec<Action>, reason: &'static str) -> Vec<Action> {
        warn!(reason, "link failure");
        self.state = LinkState::Disconnected;
        self.tx_enabled = false;
        actions.push(Action::Disconnect(reason));
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Apci, Quality};

    fn fixed_time() -> Cp56Time2a {
        Cp56Time2a {
            milliseconds: 45_000,
            minutes: 30,
            hours: 9,
            day: 15,
            day_of_week: 1,
            month: 7,
            year: 24,
            invalid: false,
            summer_time: false,
        }
    }

    fn link() -> Link {
        link_with(ClientConfig::default())
    }

    fn link_with(cfg: ClientConfig) -> Link {
        Link::with_clock(cfg, Tracer::disabled(), Box::new(fixed_time))
    }

    /// Link brought to DataActive: transport up, STARTDT confirmed.
    fn active_link() -> Link {
        active_link_with(ClientConfig::default())
    }

    fn active_link_with(cfg: ClientConfig) -> Link {
        let mut link = link_with(cfg);
        link.on_transport_up();
        link.on_apdu(&Apdu::u_frame(UFunction::StartDtCon));
        link
    }

    fn sent_frames(actions: &[Action]) -> Vec<&Apdu> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Send(apdu) => Some(apdu),
                _ => None,
            })
            .collect()
    }

    fn events(actions: &[Action]) -> Vec<&Iec104Event> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Indicate(ev) => Some(ev),
                _ => None,
            })
            .collect()
    }

    fn monitor_asdu(count: u8, cot: Cot) -> Bytes {
        let header = crate::types::AsduHeader {
            type_id: TypeId::SinglePoint,
            vsq: crate::types::Vsq::new(count, true),
            cot,
            negative: false,
            test: false,
            originator: 0,
            common_address: 1,
        };
        let objects = (0..count)
            .map(|i| {
                crate::types::InformationObject::new(
                    100 + i as u32,
                    ObjectValue::SinglePoint {
                        on: i % 2 == 0,
                        quality: Quality::GOOD,
                    },
                )
            })
            .collect();
        Asdu { header, objects }.encode()
    }

    /// Inbound I-frame with the peer's logical NS/NR.
    fn inbound(ns: u16, nr: u16, payload: Bytes) -> Apdu {
        Apdu::i_frame(ns, nr, payload)
    }

    // ---- S1: STARTDT handshake ----------------------------------------

    #[test]
    fn transport_up_sends_startdt_act() {
        let mut link = link();
        let actions = link.on_transport_up();
        let frames = sent_frames(&actions);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].apci, Apci::u_frame(UFunction::StartDtAct));
        assert_eq!(link.state(), LinkState::Connected);
        assert!(!link.tx_enabled());
    }

    #[test]
    fn startdt_con_activates_and_schedules_initial_gi() {
        let mut link = link();
        link.on_transport_up();
        let actions = link.on_apdu(&Apdu::u_frame(UFunction::StartDtCon));
        assert_eq!(events(&actions), [&Iec104Event::DataTransferStarted]);
        assert_eq!(link.state(), LinkState::DataActive);
        assert!(link.tx_enabled());

        // the initial GI fires within 15 s
        let mut gi_seen = false;
        for _ in 0..15 {
            let actions = link.on_tick();
            for frame in sent_frames(&actions) {
                if frame.is_i_frame() {
                    assert_eq!(frame.payload[0], TypeId::InterrogationCommand.as_u8());
                    assert_eq!(frame.payload[9], GI_GROUP_STATION);
                    gi_seen = true;
                }
            }
        }
        assert!(gi_seen, "initial interrogation not emitted within 15 s");
    }

    #[test]
    fn startdt_unanswered_retries_once_then_disconnects() {
        let mut link = link();
        link.on_transport_up();

        let mut retransmits = 0;
        for _ in 0..ClientConfig::default().t1 {
            let actions = link.on_tick();
            retransmits += sent_frames(&actions).len();
        }
        assert_eq!(retransmits, 1, "expected exactly one STARTDT retransmit");

        let mut disconnected = false;
        for _ in 0..ClientConfig::default().t1 {
            let actions = link.on_tick();
            if actions
                .iter()
                .any(|a| matches!(a, Action::Disconnect(_)))
            {
                disconnected = true;
            }
        }
        assert!(disconnected, "second STARTDT timeout must disconnect");
    }

    #[test]
    fn no_i_frames_before_startdt_con() {
        let mut link = link();
        link.on_transport_up();
        assert!(matches!(
            link.solicit_gi(GI_GROUP_STATION),
            Err(Iec104Error::NotConnected)
        ));
        assert!(matches!(
            link.send_command(
                0,
                1,
                ObjectValue::SingleCommand {
                    on: true,
                    qualifier: 0,
                    select: false
                }
            ),
            Err(Iec104Error::NotConnected)
        ));
    }

    // ---- sequence counting (properties 4, 5; scenario S6) --------------

    #[test]
    fn vr_advances_two_per_frame() {
        let mut link = active_link();
        let n = 40u16;
        for i in 0..n {
            let actions = link.on_apdu(&inbound(i, 0, monitor_asdu(1, Cot::Spontaneous)));
            assert!(!actions.iter().any(|a| matches!(a, Action::Disconnect(_))));
        }
        assert_eq!(link.vr(), 2 * n);
    }

    #[test]
    fn first_frame_ns_one_tolerated_exactly_once() {
        let mut link = active_link();
        // logical NS=1 is wire word 2
        let actions = link.on_apdu(&inbound(1, 0, monitor_asdu(1, Cot::Spontaneous)));
        assert!(!actions.iter().any(|a| matches!(a, Action::Disconnect(_))));
        assert_eq!(link.vr(), 4);

        // the identical frame again is now a plain sequence error
        let actions = link.on_apdu(&inbound(1, 0, monitor_asdu(1, Cot::Spontaneous)));
        assert!(actions.iter().any(|a| matches!(a, Action::Disconnect(_))));
    }

    #[test]
    fn strict_sequence_error_disconnects() {
        let mut link = active_link();
        for i in 0..2 {
            link.on_apdu(&inbound(i, 0, monitor_asdu(1, Cot::Spontaneous)));
        }
        assert_eq!(link.vr(), 4);
        // peer jumps to logical NS=5 (wire 10)
        let actions = link.on_apdu(&inbound(5, 0, monitor_asdu(1, Cot::Spontaneous)));
        assert!(actions.iter().any(|a| matches!(a, Action::Disconnect(_))));
    }

    #[test]
    fn relaxed_sequence_error_accepts_and_advances() {
        let mut link = active_link_with(ClientConfig::default().relaxed_sequence_order());
        for i in 0..2 {
            link.on_apdu(&inbound(i, 0, monitor_asdu(1, Cot::Spontaneous)));
        }
        let actions = link.on_apdu(&inbound(5, 0, monitor_asdu(1, Cot::Spontaneous)));
        assert!(!actions.iter().any(|a| matches!(a, Action::Disconnect(_))));
        assert_eq!(link.vr(), 12);
        assert!(!events(&actions).is_empty(), "payload still dispatched");
    }

    // ---- GI lifecycle (property 6, scenario S2) ------------------------

    #[test]
    fn gi_command_wire_bytes() {
        let mut link = active_link();
        let actions = link.solicit_gi(GI_GROUP_STATION).unwrap();
        let frames = sent_frames(&actions);
        assert_eq!(frames.len(), 1);
        assert_eq!(
            &frames[0].payload[..],
            &[0x64, 0x01, 0x06, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x14]
        );
        assert_eq!(frames[0].apci.send_seq(), Some(0));
        assert_eq!(link.vs(), 2);
    }

    #[test]
    fn gi_lifecycle_counts_objects() {
        let mut link = active_link();
        link.solicit_gi(GI_GROUP_STATION).unwrap();

        // ACT-CON resets the count and notifies
        let con = Asdu::single(
            Cot::ActivationConfirm,
            0,
            1,
            0,
            ObjectValue::Interrogation { qualifier: 20 },
        );
        let actions = link.on_apdu(&inbound(0, 1, con.encode()));
        assert_eq!(events(&actions), [&Iec104Event::InterrogationActConf]);
        assert_eq!(link.gi_object_count(), 0);

        // interrogation-cause data accumulates
        link.on_apdu(&inbound(1, 1, monitor_asdu(3, Cot::InterrogatedByStation)));
        link.on_apdu(&inbound(2, 1, monitor_asdu(2, Cot::InterrogatedByGroup3)));
        // spontaneous data does not
        link.on_apdu(&inbound(3, 1, monitor_asdu(4, Cot::Spontaneous)));
        assert_eq!(link.gi_object_count(), 5);

        // ACT-TERM reports the total
        let term = Asdu::single(
            Cot::ActivationTermination,
            0,
            1,
            0,
            ObjectValue::Interrogation { qualifier: 20 },
        );
        let actions = link.on_apdu(&inbound(4, 1, term.encode()));
        assert_eq!(
            events(&actions),
            [&Iec104Event::InterrogationActTerm { objects: 5 }]
        );
    }

    #[test]
    fn unanswered_gi_retries() {
        let cfg = ClientConfig::default().gi_retry_time(3);
        let mut link = active_link_with(cfg);
        link.solicit_gi(GI_GROUP_STATION).unwrap();
        // ack the first GI so the retry is not blocked by the k window check
        link.on_apdu(&Apdu::s_frame(1));

        let mut gi_frames = 0;
        for _ in 0..3 {
            let actions = link.on_tick();
            gi_frames += sent_frames(&actions)
                .iter()
                .filter(|f| f.is_i_frame())
                .count();
        }
        assert_eq!(gi_frames, 1, "retry expected after gi_retry_time");
    }

    #[test]
    fn act_con_rearms_long_period() {
        let mut link = active_link();
        link.solicit_gi(GI_GROUP_STATION).unwrap();
        let con = Asdu::single(
            Cot::ActivationConfirm,
            0,
            1,
            0,
            ObjectValue::Interrogation { qualifier: 20 },
        );
        link.on_apdu(&inbound(0, 1, con.encode()));
        assert_eq!(link.t_gi, ClientConfig::default().gi_period as i32);
    }

    // ---- commands (scenario S3) ----------------------------------------

    #[test]
    fn select_command_wire_bytes() {
        let mut link = active_link();
        let actions = link
            .send_command(
                0,
                0x000123,
                ObjectValue::SingleCommand {
                    on: true,
                    qualifier: 0,
                    select: true,
                },
            )
            .unwrap();
        let frames = sent_frames(&actions);
        assert_eq!(
            &frames[0].payload[..],
            &[0x2D, 0x01, 0x06, 0x00, 0x01, 0x00, 0x23, 0x01, 0x00, 0x81]
        );
    }

    #[test]
    fn command_echoes_surface_as_responses() {
        let mut link = active_link();
        link.send_command(
            0,
            0x000123,
            ObjectValue::SingleCommand {
                on: true,
                qualifier: 0,
                select: true,
            },
        )
        .unwrap();

        for (i, cot) in [Cot::ActivationConfirm, Cot::ActivationTermination]
            .into_iter()
            .enumerate()
        {
            let echo = Asdu::single(
                cot,
                0,
                1,
                0x000123,
                ObjectValue::SingleCommand {
                    on: true,
                    qualifier: 0,
                    select: true,
                },
            );
            let actions = link.on_apdu(&inbound(i as u16, 1, echo.encode()));
            match events(&actions)[..] {
                [Iec104Event::CommandActResp(resp)] => {
                    assert_eq!(resp.header.cot, cot);
                    assert_eq!(resp.objects[0].ioa.value(), 0x000123);
                }
                ref other => panic!("unexpected events: {other:?}"),
            }
        }
    }

    #[test]
    fn negative_confirmation_keeps_pn_flag() {
        let mut link = active_link();
        let mut echo = Asdu::single(
            Cot::ActivationConfirm,
            0,
            1,
            5,
            ObjectValue::SingleCommand {
                on: false,
                qualifier: 0,
                select: false,
            },
        );
        echo.header.negative = true;
        let actions = link.on_apdu(&inbound(0, 0, echo.encode()));
        match events(&actions)[..] {
            [Iec104Event::CommandActResp(resp)] => assert!(resp.header.negative),
            ref other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn zero_ca_falls_back_to_configured_default() {
        let mut link = active_link_with(ClientConfig::default().common_address(9));
        let actions = link
            .send_command(
                0,
                1,
                ObjectValue::SingleCommand {
                    on: true,
                    qualifier: 0,
                    select: false,
                },
            )
            .unwrap();
        let frames = sent_frames(&actions);
        assert_eq!(frames[0].payload[4], 9);
    }

    #[test]
    fn timed_command_gets_stamped() {
        let mut link = active_link();
        let actions = link
            .send_command(
                0,
                7,
                ObjectValue::SingleCommandTime {
                    on: true,
                    qualifier: 0,
                    select: false,
                    time: Cp56Time2a::ZERO,
                },
            )
            .unwrap();
        let frames = sent_frames(&actions);
        // body: SCO octet then the stamped tag
        assert_eq!(&frames[0].payload[10..], &fixed_time().to_bytes());
    }

    #[test]
    fn explicit_time_tag_is_preserved() {
        let mut link = active_link();
        let tag = Cp56Time2a {
            milliseconds: 1,
            minutes: 2,
            hours: 3,
            day: 4,
            day_of_week: 5,
            month: 6,
            year: 7,
            invalid: false,
            summer_time: false,
        };
        let actions = link
            .send_command(
                0,
                7,
                ObjectValue::SingleCommandTime {
                    on: true,
                    qualifier: 0,
                    select: false,
                    time: tag,
                },
            )
            .unwrap();
        let frames = sent_frames(&actions);
        assert_eq!(&frames[0].payload[10..], &tag.to_bytes());
    }

    #[test]
    fn k_window_refuses_excess_sends() {
        let cfg = ClientConfig::default().k(2);
        let mut link = active_link_with(cfg);
        let cmd = || ObjectValue::SingleCommand {
            on: true,
            qualifier: 0,
            select: false,
        };
        link.send_command(0, 1, cmd()).unwrap();
        link.send_command(0, 2, cmd()).unwrap();
        assert!(matches!(
            link.send_command(0, 3, cmd()),
            Err(Iec104Error::TooManyUnconfirmed(2))
        ));

        // an S-frame acknowledging both reopens the window
        link.on_apdu(&Apdu::s_frame(2));
        assert_eq!(link.outstanding(), 0);
        link.send_command(0, 3, cmd()).unwrap();
    }

    #[test]
    fn unacknowledged_i_frames_time_out() {
        let cfg = ClientConfig::default().t1(3);
        let mut link = active_link_with(cfg);
        link.send_command(
            0,
            1,
            ObjectValue::SingleCommand {
                on: true,
                qualifier: 0,
                select: false,
            },
        )
        .unwrap();

        let mut disconnected = false;
        for _ in 0..3 {
            let actions = link.on_tick();
            disconnected |= actions.iter().any(|a| matches!(a, Action::Disconnect(_)));
        }
        assert!(disconnected, "t1 on unacknowledged I-frames must disconnect");
    }

    // ---- test command (scenario S4) ------------------------------------

    #[test]
    fn test_command_activation_is_confirmed_with_tsc_echo() {
        let mut link = active_link();
        let request = Asdu::single(
            Cot::Activation,
            0,
            1,
            0,
            ObjectValue::TestCommand {
                counter: 0x0042,
                time: fixed_time(),
            },
        );
        let actions = link.on_apdu(&inbound(0, 0, request.encode()));
        let frames = sent_frames(&actions);
        assert_eq!(frames.len(), 1);
        let payload = &frames[0].payload;
        assert_eq!(payload[0], TypeId::TestCommandTime.as_u8());
        assert_eq!(payload[2], Cot::ActivationConfirm.as_u8());
        // TSC echoed, fresh local stamp appended
        assert_eq!(&payload[9..11], &[0x42, 0x00]);
        assert_eq!(&payload[11..], &fixed_time().to_bytes());
    }

    #[test]
    fn test_command_counter_increments() {
        let mut link = active_link();
        let first = link.send_test_command().unwrap();
        let second = link.send_test_command().unwrap();
        assert_eq!(&sent_frames(&first)[0].payload[9..11], &[0x00, 0x00]);
        assert_eq!(&sent_frames(&second)[0].payload[9..11], &[0x01, 0x00]);
    }

    // ---- supervisory & idle timers -------------------------------------

    #[test]
    fn w_threshold_forces_s_frame() {
        let cfg = ClientConfig::default().w(3);
        let mut link = active_link_with(cfg);
        for i in 0..2 {
            let actions = link.on_apdu(&inbound(i, 0, monitor_asdu(1, Cot::Spontaneous)));
            assert!(sent_frames(&actions).is_empty(), "no ack before w");
        }
        let actions = link.on_apdu(&inbound(2, 0, monitor_asdu(1, Cot::Spontaneous)));
        let frames = sent_frames(&actions);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_s_frame());
        assert_eq!(frames[0].apci.recv_seq(), Some(3));
    }

    #[test]
    fn t2_expiry_sends_s_frame_at_half_rate() {
        // t2=4 with the doubled decrement fires after two ticks
        let cfg = ClientConfig::default().t2(4);
        let mut link = active_link_with(cfg);
        link.on_apdu(&inbound(0, 0, monitor_asdu(1, Cot::Spontaneous)));

        let actions = link.on_tick();
        assert!(sent_frames(&actions).is_empty());
        let actions = link.on_tick();
        let frames = sent_frames(&actions);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_s_frame());
    }

    #[test]
    fn supervisory_disabled_acks_immediately() {
        let mut cfg = ClientConfig::default();
        cfg.supervisory_enabled = false;
        let mut link = active_link_with(cfg);
        let actions = link.on_apdu(&inbound(0, 0, monitor_asdu(1, Cot::Spontaneous)));
        let frames = sent_frames(&actions);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_s_frame());
    }

    #[test]
    fn testfr_probe_after_t3_idle() {
        let cfg = ClientConfig::default().t3(5);
        let mut link = active_link_with(cfg);
        let mut probe_seen = false;
        for _ in 0..5 {
            let actions = link.on_tick();
            for frame in sent_frames(&actions) {
                assert_eq!(frame.apci, Apci::u_frame(UFunction::TestFrAct));
                probe_seen = true;
            }
        }
        assert!(probe_seen, "TESTFR act expected after t3 idle");

        // confirmation restarts the idle probe and clears the window
        link.on_apdu(&Apdu::u_frame(UFunction::TestFrCon));
        assert_eq!(link.t_testfr_con, -1);
        assert_eq!(link.t_testfr, 5);
    }

    #[test]
    fn testfr_unanswered_disconnects() {
        let cfg = ClientConfig::default().t3(2).t1(3);
        let mut link = active_link_with(cfg);
        let mut disconnected = false;
        for _ in 0..8 {
            let actions = link.on_tick();
            disconnected |= actions.iter().any(|a| matches!(a, Action::Disconnect(_)));
        }
        assert!(disconnected, "missing TESTFR con must disconnect");
    }

    #[test]
    fn testfr_act_from_peer_is_confirmed() {
        let mut link = active_link();
        let actions = link.on_apdu(&Apdu::u_frame(UFunction::TestFrAct));
        let frames = sent_frames(&actions);
        assert_eq!(frames[0].apci, Apci::u_frame(UFunction::TestFrCon));
    }

    // ---- tolerance and teardown ----------------------------------------

    #[test]
    fn unknown_type_is_dropped_but_link_survives() {
        let mut link = active_link();
        // type 104 (plain test command) is outside the closed set
        let payload = Bytes::from_static(&[0x68, 0x01, 0x06, 0x00, 0x01, 0x00, 0, 0, 0, 0xAA]);
        let actions = link.on_apdu(&inbound(0, 0, payload));
        assert!(events(&actions).is_empty());
        assert!(!actions.iter().any(|a| matches!(a, Action::Disconnect(_))));
        // sequence accounting happened regardless
        assert_eq!(link.vr(), 2);
    }

    #[test]
    fn truncated_asdu_is_dropped_but_link_survives() {
        let mut link = active_link();
        // measured float claims one object but the body is missing
        let payload = Bytes::from_static(&[0x0D, 0x01, 0x03, 0x00, 0x01, 0x00, 0x01, 0x00]);
        let actions = link.on_apdu(&inbound(0, 0, payload));
        assert!(events(&actions).is_empty());
        assert_eq!(link.vr(), 2);
    }

    #[test]
    fn end_of_init_surfaces() {
        let mut link = active_link();
        let asdu = Asdu::single(
            Cot::Initialized,
            0,
            1,
            0,
            ObjectValue::EndOfInit {
                cause: 2,
                after_parameter_change: false,
            },
        );
        let actions = link.on_apdu(&inbound(0, 0, asdu.encode()));
        assert!(matches!(
            events(&actions)[..],
            [Iec104Event::EndOfInit(_)]
        ));
    }

    #[test]
    fn transport_down_disarms_everything() {
        let mut link = active_link();
        link.solicit_gi(GI_GROUP_STATION).unwrap();
        link.on_transport_down();
        assert_eq!(link.state(), LinkState::Disconnected);
        assert!(!link.tx_enabled());
        assert!(link.on_tick().is_empty());
        // inbound frames after teardown are ignored
        assert!(link
            .on_apdu(&inbound(0, 0, monitor_asdu(1, Cot::Spontaneous)))
            .is_empty());
    }

    #[test]
    fn counters_reset_on_reconnect() {
        let mut link = active_link();
        link.on_apdu(&inbound(0, 0, monitor_asdu(1, Cot::Spontaneous)));
        link.solicit_gi(GI_GROUP_STATION).unwrap();
        assert!(link.vr() > 0 && link.vs() > 0);

        link.on_transport_down();
        link.on_transport_up();
        assert_eq!(link.vr(), 0);
        assert_eq!(link.vs(), 0);
        assert_eq!(link.outstanding(), 0);
    }
}
