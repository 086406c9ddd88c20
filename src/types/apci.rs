//! APCI: the fixed control header of every 104 frame.
//!
//! Wire form: start octet 0x68, one length octet, four control octets.
//! Bit 0 of the first control octet discriminates I-frames; the low two
//! bits discriminate S- and U-frames. Sequence numbers occupy bits 1..15
//! of their 16-bit little-endian words.

use crate::error::{Iec104Error, Result};

/// Start octet of every APDU.
pub const START_BYTE: u8 = 0x68;

/// Smallest legal value of the length octet (the four control octets).
pub const MIN_APDU_LENGTH: usize = 4;

/// Largest legal value of the length octet.
pub const MAX_APDU_LENGTH: usize = 253;

/// Unnumbered (U-frame) control functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UFunction {
    /// STARTDT act: enable data transfer
    StartDtAct,
    /// STARTDT con
    StartDtCon,
    /// STOPDT act: disable data transfer
    StopDtAct,
    /// STOPDT con
    StopDtCon,
    /// TESTFR act: link test probe
    TestFrAct,
    /// TESTFR con
    TestFrCon,
}

impl UFunction {
    /// First control octet for this function (one of bits 2..7 set over 0x03).
    pub const fn control_byte(self) -> u8 {
        match self {
            Self::StartDtAct => 0x07,
            Self::StartDtCon => 0x0B,
            Self::StopDtAct => 0x13,
            Self::StopDtCon => 0x23,
            Self::TestFrAct => 0x43,
            Self::TestFrCon => 0x83,
        }
    }

    /// Decode from the first control octet.
    pub fn from_control_byte(byte: u8) -> Result<Self> {
        match byte {
            0x07 => Ok(Self::StartDtAct),
            0x0B => Ok(Self::StartDtCon),
            0x13 => Ok(Self::StopDtAct),
            0x23 => Ok(Self::StopDtCon),
            0x43 => Ok(Self::TestFrAct),
            0x83 => Ok(Self::TestFrCon),
            _ => Err(Iec104Error::invalid_frame(format!(
                "unknown U function 0x{byte:02X}"
            ))),
        }
    }

    /// Trace spelling, as the station logs it.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::StartDtAct => "STARTDTACT",
            Self::StartDtCon => "STARTDTCON",
            Self::StopDtAct => "STOPDTACT",
            Self::StopDtCon => "STOPDTCON",
            Self::TestFrAct => "TESTFRACT",
            Self::TestFrCon => "TESTFRCON",
        }
    }
}

/// Parsed control field of an APDU.
///
/// Sequence numbers are held in logical form (0..=32767); the wire shift
/// that reserves bit 0 for the frame discriminator is applied on encode
/// and removed on parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Apci {
    /// Numbered information frame; carries an ASDU.
    IFrame {
        /// Send sequence number NS (logical, 0..=32767)
        send_seq: u16,
        /// Receive sequence number NR (logical, 0..=32767)
        recv_seq: u16,
    },
    /// Supervisory acknowledgement.
    SFrame {
        /// Receive sequence number NR (logical, 0..=32767)
        recv_seq: u16,
    },
    /// Unnumbered control function.
    UFrame {
        /// Which of the six functions
        function: UFunction,
    },
}

impl Apci {
    /// I-frame control field.
    pub const fn i_frame(send_seq: u16, recv_seq: u16) -> Self {
        Self::IFrame { send_seq, recv_seq }
    }

    /// S-frame control field.
    pub const fn s_frame(recv_seq: u16) -> Self {
        Self::SFrame { recv_seq }
    }

    /// U-frame control field.
    pub const fn u_frame(function: UFunction) -> Self {
        Self::UFrame { function }
    }

    /// Parse the four control octets.
    pub fn parse(control: &[u8]) -> Result<Self> {
        if control.len() < 4 {
            return Err(Iec104Error::invalid_frame_static("control field too short"));
        }

        let cf1 = control[0];
        if cf1 & 0x01 == 0 {
            let send_seq = ((control[1] as u16) << 7) | ((cf1 >> 1) as u16);
            let recv_seq = ((control[3] as u16) << 7) | ((control[2] >> 1) as u16);
            Ok(Self::IFrame { send_seq, recv_seq })
        } else if cf1 & 0x03 == 0x01 {
            let recv_seq = ((control[3] as u16) << 7) | ((control[2] >> 1) as u16);
            Ok(Self::SFrame { recv_seq })
        } else {
            // low two bits == 0b11
            let function = UFunction::from_control_byte(cf1)?;
            Ok(Self::UFrame { function })
        }
    }

    /// Encode the four control octets.
    pub fn encode(&self) -> [u8; 4] {
        match *self {
            Self::IFrame { send_seq, recv_seq } => [
                ((send_seq & 0x7F) << 1) as u8,
                (send_seq >> 7) as u8,
                ((recv_seq & 0x7F) << 1) as u8,
                (recv_seq >> 7) as u8,
            ],
            Self::SFrame { recv_seq } => [
                0x01,
                0x00,
                ((recv_seq & 0x7F) << 1) as u8,
                (recv_seq >> 7) as u8,
            ],
            Self::UFrame { function } => [function.control_byte(), 0x00, 0x00, 0x00],
        }
    }

    /// Whether this is an I-frame.
    pub const fn is_i_frame(&self) -> bool {
        matches!(self, Self::IFrame { .. })
    }

    /// Whether this is an S-frame.
    pub const fn is_s_frame(&self) -> bool {
        matches!(self, Self::SFrame { .. })
    }

    /// Whether this is a U-frame.
    pub const fn is_u_frame(&self) -> bool {
        matches!(self, Self::UFrame { .. })
    }

    /// Send sequence number, I-frames only.
    pub const fn send_seq(&self) -> Option<u16> {
        match self {
            Self::IFrame { send_seq, .. } => Some(*send_seq),
            _ => None,
        }
    }

    /// Receive sequence number, I- and S-frames.
    pub const fn recv_seq(&self) -> Option<u16> {
        match self {
            Self::IFrame { recv_seq, .. } | Self::SFrame { recv_seq } => Some(*recv_seq),
            _ => None,
        }
    }
}

impl std::fmt::Display for Apci {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IFrame { send_seq, recv_seq } => write!(f, "I(NS={send_seq}, NR={recv_seq})"),
            Self::SFrame { recv_seq } => write!(f, "S(NR={recv_seq})"),
            Self::UFrame { function } => write!(f, "U({})", function.mnemonic()),
        }
    }
}
