//! Information object bodies: one enum arm per type identification.
//!
//! The original wire layouts are packed C bit-fields; here every field is
//! placed by explicit shifts and masks, LSB-first within each octet.

use bytes::{BufMut, BytesMut};

use crate::error::{Iec104Error, Result};
use crate::types::{Cp56Time2a, TypeId};

/// Shared quality descriptor.
///
/// BL/SB/NT/IV occupy bits 4..7 of every quality octet; OV rides in bit 0
/// of the measured-value form (QDS) and is absent from SIQ/DIQ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Quality {
    /// OV: value overflowed its range
    pub overflow: bool,
    /// BL: blocked for transmission
    pub blocked: bool,
    /// SB: substituted
    pub substituted: bool,
    /// NT: not topical
    pub not_topical: bool,
    /// IV: invalid
    pub invalid: bool,
}

impl Quality {
    /// All flags clear.
    pub const GOOD: Self = Self {
        overflow: false,
        blocked: false,
        substituted: false,
        not_topical: false,
        invalid: false,
    };

    /// Read BL/SB/NT/IV from bits 4..7 (SIQ, DIQ, QDP forms).
    #[inline]
    pub const fn from_high_bits(byte: u8) -> Self {
        Self {
            overflow: false,
            blocked: (byte & 0x10) != 0,
            substituted: (byte & 0x20) != 0,
            not_topical: (byte & 0x40) != 0,
            invalid: (byte & 0x80) != 0,
        }
    }

    /// Read a full QDS octet (OV in bit 0).
    #[inline]
    pub const fn from_qds(byte: u8) -> Self {
        let mut quality = Self::from_high_bits(byte);
        quality.overflow = (byte & 0x01) != 0;
        quality
    }

    /// BL/SB/NT/IV packed into bits 4..7.
    #[inline]
    pub const fn high_bits(&self) -> u8 {
        (self.blocked as u8) << 4
            | (self.substituted as u8) << 5
            | (self.not_topical as u8) << 6
            | (self.invalid as u8) << 7
    }

    /// Full QDS octet.
    #[inline]
    pub const fn qds_byte(&self) -> u8 {
        self.overflow as u8 | self.high_bits()
    }

    /// No flag raised.
    #[inline]
    pub const fn is_good(&self) -> bool {
        !self.overflow && !self.blocked && !self.substituted && !self.not_topical && !self.invalid
    }
}

impl std::fmt::Display for Quality {
    /// Lowercase flag list in trace order (`ov bl nt sb iv`), empty when good.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (set, tag) in [
            (self.overflow, "ov "),
            (self.blocked, "bl "),
            (self.not_topical, "nt "),
            (self.substituted, "sb "),
            (self.invalid, "iv "),
        ] {
            if set {
                f.write_str(tag)?;
            }
        }
        Ok(())
    }
}

/// Double-point information value (2 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DoublePointState {
    /// Indeterminate or intermediate (00)
    Indeterminate = 0,
    /// Determined OFF (01)
    Off = 1,
    /// Determined ON (10)
    On = 2,
    /// Indeterminate or faulty (11)
    IndeterminateOrFaulty = 3,
}

impl DoublePointState {
    /// From the low two bits of an octet.
    #[inline]
    pub const fn from_bits(byte: u8) -> Self {
        match byte & 0x03 {
            1 => Self::Off,
            2 => Self::On,
            3 => Self::IndeterminateOrFaulty,
            _ => Self::Indeterminate,
        }
    }

    /// Trace spelling (`tra`, `off`, `on`, `ind`).
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Indeterminate => "tra",
            Self::Off => "off",
            Self::On => "on",
            Self::IndeterminateOrFaulty => "ind",
        }
    }
}

/// Binary counter reading (BCR), integrated totals types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryCounter {
    /// Counter reading
    pub value: u32,
    /// Sequence notation (0..=31)
    pub sequence: u8,
    /// CY: carry during the integration period
    pub carry: bool,
    /// CA: counter was adjusted
    pub adjusted: bool,
    /// IV: reading invalid
    pub invalid: bool,
}

impl BinaryCounter {
    fn decode(data: &[u8]) -> Self {
        let flags = data[4];
        Self {
            value: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            sequence: flags & 0x1F,
            carry: (flags & 0x20) != 0,
            adjusted: (flags & 0x40) != 0,
            invalid: (flags & 0x80) != 0,
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.value);
        buf.put_u8(
            (self.sequence & 0x1F)
                | (self.carry as u8) << 5
                | (self.adjusted as u8) << 6
                | (self.invalid as u8) << 7,
        );
    }
}

/// SPE: start events of protection equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StartEvents {
    /// GS: general start
    pub general: bool,
    /// SL1..SL3: start of operation phases L1..L3
    pub l1: bool,
    pub l2: bool,
    pub l3: bool,
    /// SIE: start of operation IE (earth current)
    pub earth: bool,
    /// SRD: start of operation in reverse direction
    pub reverse: bool,
}

impl StartEvents {
    const fn from_byte(byte: u8) -> Self {
        Self {
            general: (byte & 0x01) != 0,
            l1: (byte & 0x02) != 0,
            l2: (byte & 0x04) != 0,
            l3: (byte & 0x08) != 0,
            earth: (byte & 0x10) != 0,
            reverse: (byte & 0x20) != 0,
        }
    }

    const fn to_byte(self) -> u8 {
        self.general as u8
            | (self.l1 as u8) << 1
            | (self.l2 as u8) << 2
            | (self.l3 as u8) << 3
            | (self.earth as u8) << 4
            | (self.reverse as u8) << 5
    }
}

/// OCI: output circuit information of protection equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputCircuits {
    /// GC: general command to output circuit
    pub general: bool,
    /// CL1..CL3: command to output circuit phases L1..L3
    pub l1: bool,
    pub l2: bool,
    pub l3: bool,
}

impl OutputCircuits {
    const fn from_byte(byte: u8) -> Self {
        Self {
            general: (byte & 0x01) != 0,
            l1: (byte & 0x02) != 0,
            l2: (byte & 0x04) != 0,
            l3: (byte & 0x08) != 0,
        }
    }

    const fn to_byte(self) -> u8 {
        self.general as u8 | (self.l1 as u8) << 1 | (self.l2 as u8) << 2 | (self.l3 as u8) << 3
    }
}

/// Decoded body of one information object, keyed by type identification.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectValue {
    /// M_SP_NA_1 (1)
    SinglePoint { on: bool, quality: Quality },
    /// M_DP_NA_1 (3)
    DoublePoint {
        state: DoublePointState,
        quality: Quality,
    },
    /// M_ST_NA_1 (5); value is the 7-bit transformer step, -64..=63
    StepPosition {
        value: i8,
        transient: bool,
        quality: Quality,
    },
    /// M_BO_NA_1 (7)
    Bitstring32 { bits: u32, quality: Quality },
    /// M_ME_NA_1 (9); raw 16-bit normalized value
    MeasuredNormalized { value: i16, quality: Quality },
    /// M_ME_NB_1 (11)
    MeasuredScaled { value: i16, quality: Quality },
    /// M_ME_NC_1 (13)
    MeasuredFloat { value: f32, quality: Quality },
    /// M_IT_NA_1 (15)
    IntegratedTotals { counter: BinaryCounter },
    /// M_PS_NA_1 (20); 16 status bits plus their change-detection bits
    PackedSinglePoint {
        status: u16,
        changes: u16,
        quality: Quality,
    },
    /// M_ME_ND_1 (21)
    MeasuredNormalizedNoQuality { value: i16 },

    /// M_SP_TB_1 (30)
    SinglePointTime {
        on: bool,
        quality: Quality,
        time: Cp56Time2a,
    },
    /// M_DP_TB_1 (31)
    DoublePointTime {
        state: DoublePointState,
        quality: Quality,
        time: Cp56Time2a,
    },
    /// M_ST_TB_1 (32)
    StepPositionTime {
        value: i8,
        transient: bool,
        quality: Quality,
        time: Cp56Time2a,
    },
    /// M_BO_TB_1 (33)
    Bitstring32Time {
        bits: u32,
        quality: Quality,
        time: Cp56Time2a,
    },
    /// M_ME_TD_1 (34)
    MeasuredNormalizedTime {
        value: i16,
        quality: Quality,
        time: Cp56Time2a,
    },
    /// M_ME_TE_1 (35)
    MeasuredScaledTime {
        value: i16,
        quality: Quality,
        time: Cp56Time2a,
    },
    /// M_ME_TF_1 (36)
    MeasuredFloatTime {
        value: f32,
        quality: Quality,
        time: Cp56Time2a,
    },
    /// M_IT_TB_1 (37)
    IntegratedTotalsTime {
        counter: BinaryCounter,
        time: Cp56Time2a,
    },
    /// M_EP_TD_1 (38)
    ProtectionEventTime {
        state: DoublePointState,
        elapsed_invalid: bool,
        quality: Quality,
        elapsed_ms: u16,
        time: Cp56Time2a,
    },
    /// M_EP_TE_1 (39)
    ProtectionStartEventsTime {
        events: StartEvents,
        elapsed_invalid: bool,
        quality: Quality,
        elapsed_ms: u16,
        time: Cp56Time2a,
    },
    /// M_EP_TF_1 (40)
    ProtectionOutputCircuitTime {
        circuits: OutputCircuits,
        elapsed_invalid: bool,
        quality: Quality,
        elapsed_ms: u16,
        time: Cp56Time2a,
    },

    /// C_SC_NA_1 (45)
    SingleCommand {
        on: bool,
        qualifier: u8,
        select: bool,
    },
    /// C_DC_NA_1 (46); state uses the double-point encoding (1=off, 2=on)
    DoubleCommand {
        state: u8,
        qualifier: u8,
        select: bool,
    },
    /// C_RC_NA_1 (47); step 1=lower, 2=higher
    RegulatingStep {
        step: u8,
        qualifier: u8,
        select: bool,
    },
    /// C_SE_NA_1 (48)
    SetpointNormalized {
        value: i16,
        qualifier: u8,
        select: bool,
    },
    /// C_SE_NB_1 (49)
    SetpointScaled {
        value: i16,
        qualifier: u8,
        select: bool,
    },
    /// C_SE_NC_1 (50)
    SetpointFloat {
        value: f32,
        qualifier: u8,
        select: bool,
    },
    /// C_SC_TA_1 (58)
    SingleCommandTime {
        on: bool,
        qualifier: u8,
        select: bool,
        time: Cp56Time2a,
    },
    /// C_DC_TA_1 (59)
    DoubleCommandTime {
        state: u8,
        qualifier: u8,
        select: bool,
        time: Cp56Time2a,
    },
    /// C_RC_TA_1 (60)
    RegulatingStepTime {
        step: u8,
        qualifier: u8,
        select: bool,
        time: Cp56Time2a,
    },
    /// C_SE_TA_1 (61)
    SetpointNormalizedTime {
        value: i16,
        qualifier: u8,
        select: bool,
        time: Cp56Time2a,
    },
    /// C_SE_TB_1 (62)
    SetpointScaledTime {
        value: i16,
        qualifier: u8,
        select: bool,
        time: Cp56Time2a,
    },
    /// C_SE_TC_1 (63)
    SetpointFloatTime {
        value: f32,
        qualifier: u8,
        select: bool,
        time: Cp56Time2a,
    },

    /// M_EI_NA_1 (70); COI: cause of initialization
    EndOfInit { cause: u8, after_parameter_change: bool },
    /// C_IC_NA_1 (100); QOI: interrogation group, 20 = station
    Interrogation { qualifier: u8 },
    /// C_CI_NA_1 (101); QCC: request (RQT) and freeze (FRZ) fields
    CounterInterrogation { request: u8, freeze: u8 },
    /// C_RD_NA_1 (102); the address alone carries the request
    Read,
    /// C_CS_NA_1 (103)
    ClockSync { time: Cp56Time2a },
    /// C_RP_NA_1 (105); QRP: qualifier of reset process
    ResetProcess { qualifier: u8 },
    /// C_TS_TA_1 (107); TSC: test sequence counter
    TestCommand { counter: u16, time: Cp56Time2a },

    /// P_ME_NA_1 (110); KPA: kind of parameter
    ParameterNormalized {
        value: i16,
        kind: u8,
        in_operation: bool,
        local_change: bool,
    },
    /// P_ME_NB_1 (111)
    ParameterScaled {
        value: i16,
        kind: u8,
        in_operation: bool,
        local_change: bool,
    },
    /// P_ME_NC_1 (112)
    ParameterFloat {
        value: f32,
        kind: u8,
        in_operation: bool,
        local_change: bool,
    },
    /// P_AC_NA_1 (113); QPA: qualifier of parameter activation
    ParameterActivation { qualifier: u8 },
}

/// Sign-extend the 7-bit VTI value field.
#[inline]
const fn vti_value(byte: u8) -> i8 {
    (((byte & 0x7F) << 1) as i8) >> 1
}

impl ObjectValue {
    /// Fixed body length in octets for a type (excludes the IOA).
    pub const fn body_len(type_id: TypeId) -> usize {
        use TypeId::*;
        match type_id {
            SinglePoint | DoublePoint => 1,
            StepPosition | MeasuredNormalizedNoQuality => 2,
            MeasuredNormalized | MeasuredScaled => 3,
            Bitstring32 | MeasuredFloat | IntegratedTotals | PackedSinglePoint => 5,
            SinglePointTime | DoublePointTime => 8,
            StepPositionTime => 9,
            MeasuredNormalizedTime | MeasuredScaledTime => 10,
            Bitstring32Time | MeasuredFloatTime | IntegratedTotalsTime => 12,
            ProtectionEventTime => 10,
            ProtectionStartEventsTime | ProtectionOutputCircuitTime => 11,
            SingleCommand | DoubleCommand | RegulatingStepCommand => 1,
            SetpointNormalized | SetpointScaled => 3,
            SetpointFloat => 5,
            SingleCommandTime | DoubleCommandTime | RegulatingStepCommandTime => 8,
            SetpointNormalizedTime | SetpointScaledTime => 10,
            SetpointFloatTime => 12,
            EndOfInit | InterrogationCommand | CounterInterrogation | ResetProcess
            | ParameterActivation => 1,
            ReadCommand => 0,
            ClockSync => 7,
            TestCommandTime => 9,
            ParameterNormalized | ParameterScaled => 3,
            ParameterFloat => 5,
        }
    }

    /// Type identification this value encodes as.
    pub const fn type_id(&self) -> TypeId {
        use ObjectValue::*;
        match self {
            SinglePoint { .. } => TypeId::SinglePoint,
            DoublePoint { .. } => TypeId::DoublePoint,
            StepPosition { .. } => TypeId::StepPosition,
            Bitstring32 { .. } => TypeId::Bitstring32,
            MeasuredNormalized { .. } => TypeId::MeasuredNormalized,
            MeasuredScaled { .. } => TypeId::MeasuredScaled,
            MeasuredFloat { .. } => TypeId::MeasuredFloat,
            IntegratedTotals { .. } => TypeId::IntegratedTotals,
            PackedSinglePoint { .. } => TypeId::PackedSinglePoint,
            MeasuredNormalizedNoQuality { .. } => TypeId::MeasuredNormalizedNoQuality,
            SinglePointTime { .. } => TypeId::SinglePointTime,
            DoublePointTime { .. } => TypeId::DoublePointTime,
            StepPositionTime { .. } => TypeId::StepPositionTime,
            Bitstring32Time { .. } => TypeId::Bitstring32Time,
            MeasuredNormalizedTime { .. } => TypeId::MeasuredNormalizedTime,
            MeasuredScaledTime { .. } => TypeId::MeasuredScaledTime,
            MeasuredFloatTime { .. } => TypeId::MeasuredFloatTime,
            IntegratedTotalsTime { .. } => TypeId::IntegratedTotalsTime,
            ProtectionEventTime { .. } => TypeId::ProtectionEventTime,
            ProtectionStartEventsTime { .. } => TypeId::ProtectionStartEventsTime,
            ProtectionOutputCircuitTime { .. } => TypeId::ProtectionOutputCircuitTime,
            SingleCommand { .. } => TypeId::SingleCommand,
            DoubleCommand { .. } => TypeId::DoubleCommand,
            RegulatingStep { .. } => TypeId::RegulatingStepCommand,
            SetpointNormalized { .. } => TypeId::SetpointNormalized,
            SetpointScaled { .. } => TypeId::SetpointScaled,
            SetpointFloat { .. } => TypeId::SetpointFloat,
            SingleCommandTime { .. } => TypeId::SingleCommandTime,
            DoubleCommandTime { .. } => TypeId::DoubleCommandTime,
            RegulatingStepTime { .. } => TypeId::RegulatingStepCommandTime,
            SetpointNormalizedTime { .. } => TypeId::SetpointNormalizedTime,
            SetpointScaledTime { .. } => TypeId::SetpointScaledTime,
            SetpointFloatTime { .. } => TypeId::SetpointFloatTime,
            EndOfInit { .. } => TypeId::EndOfInit,
            Interrogation { .. } => TypeId::InterrogationCommand,
            CounterInterrogation { .. } => TypeId::CounterInterrogation,
            Read => TypeId::ReadCommand,
            ClockSync { .. } => TypeId::ClockSync,
            ResetProcess { .. } => TypeId::ResetProcess,
            TestCommand { .. } => TypeId::TestCommandTime,
            ParameterNormalized { .. } => TypeId::ParameterNormalized,
            ParameterScaled { .. } => TypeId::ParameterScaled,
            ParameterFloat { .. } => TypeId::ParameterFloat,
            ParameterActivation { .. } => TypeId::ParameterActivation,
        }
    }

    /// Decode a body of `body_len(type_id)` octets.
    pub fn decode_body(type_id: TypeId, data: &[u8]) -> Result<Self> {
        if data.len() < Self::body_len(type_id) {
            return Err(Iec104Error::invalid_asdu(format!(
                "object body too short for {type_id}"
            )));
        }

        let i16_at = |i: usize| i16::from_le_bytes([data[i], data[i + 1]]);
        let u16_at = |i: usize| u16::from_le_bytes([data[i], data[i + 1]]);
        let u32_at = |i: usize| u32::from_le_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
        let f32_at = |i: usize| f32::from_le_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
        let time_at = |i: usize| Cp56Time2a::from_bytes(&data[i..i + 7]);

        Ok(match type_id {
            TypeId::SinglePoint => Self::SinglePoint {
                on: (data[0] & 0x01) != 0,
                quality: Quality::from_high_bits(data[0]),
            },
            TypeId::DoublePoint => Self::DoublePoint {
                state: DoublePointState::from_bits(data[0]),
                quality: Quality::from_high_bits(data[0]),
            },
            TypeId::StepPosition => Self::StepPosition {
                value: vti_value(data[0]),
                transient: (data[0] & 0x80) != 0,
                quality: Quality::from_qds(data[1]),
            },
            TypeId::Bitstring32 => Self::Bitstring32 {
                bits: u32_at(0),
                quality: Quality::from_qds(data[4]),
            },
            TypeId::MeasuredNormalized => Self::MeasuredNormalized {
                value: i16_at(0),
                quality: Quality::from_qds(data[2]),
            },
            TypeId::MeasuredScaled => Self::MeasuredScaled {
                value: i16_at(0),
                quality: Quality::from_qds(data[2]),
            },
            TypeId::MeasuredFloat => Self::MeasuredFloat {
                value: f32_at(0),
                quality: Quality::from_qds(data[4]),
            },
            TypeId::IntegratedTotals => Self::IntegratedTotals {
                counter: BinaryCounter::decode(data),
            },
            TypeId::PackedSinglePoint => Self::PackedSinglePoint {
                status: u16_at(0),
                changes: u16_at(2),
                quality: Quality::from_qds(data[4]),
            },
            TypeId::MeasuredNormalizedNoQuality => {
                Self::MeasuredNormalizedNoQuality { value: i16_at(0) }
            }
            TypeId::SinglePointTime => Self::SinglePointTime {
                on: (data[0] & 0x01) != 0,
                quality: Quality::from_high_bits(data[0]),
                time: time_at(1)?,
            },
            TypeId::DoublePointTime => Self::DoublePointTime {
                state: DoublePointState::from_bits(data[0]),
                quality: Quality::from_high_bits(data[0]),
                time: time_at(1)?,
            },
            TypeId::StepPositionTime => Self::StepPositionTime {
                value: vti_value(data[0]),
                transient: (data[0] & 0x80) != 0,
                quality: Quality::from_qds(data[1]),
                time: time_at(2)?,
            },
            TypeId::Bitstring32Time => Self::Bitstring32Time {
                bits: u32_at(0),
                quality: Quality::from_qds(data[4]),
                time: time_at(5)?,
            },
            TypeId::MeasuredNormalizedTime => Self::MeasuredNormalizedTime {
                value: i16_at(0),
                quality: Quality::from_qds(data[2]),
                time: time_at(3)?,
            },
            TypeId::MeasuredScaledTime => Self::MeasuredScaledTime {
                value: i16_at(0),
                quality: Quality::from_qds(data[2]),
                time: time_at(3)?,
            },
            TypeId::MeasuredFloatTime => Self::MeasuredFloatTime {
                value: f32_at(0),
                quality: Quality::from_qds(data[4]),
                time: time_at(5)?,
            },
            TypeId::IntegratedTotalsTime => Self::IntegratedTotalsTime {
                counter: BinaryCounter::decode(data),
                time: time_at(5)?,
            },
            TypeId::ProtectionEventTime => Self::ProtectionEventTime {
                state: DoublePointState::from_bits(data[0]),
                elapsed_invalid: (data[0] & 0x08) != 0,
                quality: Quality::from_high_bits(data[0]),
                elapsed_ms: u16_at(1),
                time: time_at(3)?,
            },
            TypeId::ProtectionStartEventsTime => Self::ProtectionStartEventsTime {
                events: StartEvents::from_byte(data[0]),
                elapsed_invalid: (data[1] & 0x08) != 0,
                quality: Quality::from_high_bits(data[1]),
                elapsed_ms: u16_at(2),
                time: time_at(4)?,
            },
            TypeId::ProtectionOutputCircuitTime => Self::ProtectionOutputCircuitTime {
                circuits: OutputCircuits::from_byte(data[0]),
                elapsed_invalid: (data[1] & 0x08) != 0,
                quality: Quality::from_high_bits(data[1]),
                elapsed_ms: u16_at(2),
                time: time_at(4)?,
            },
            TypeId::SingleCommand => Self::SingleCommand {
                on: (data[0] & 0x01) != 0,
                qualifier: (data[0] >> 2) & 0x1F,
                select: (data[0] & 0x80) != 0,
            },
            TypeId::DoubleCommand => Self::DoubleCommand {
                state: data[0] & 0x03,
                qualifier: (data[0] >> 2) & 0x1F,
                select: (data[0] & 0x80) != 0,
            },
            TypeId::RegulatingStepCommand => Self::RegulatingStep {
                step: data[0] & 0x03,
                qualifier: (data[0] >> 2) & 0x1F,
                select: (data[0] & 0x80) != 0,
            },
            TypeId::SetpointNormalized => Self::SetpointNormalized {
                value: i16_at(0),
                qualifier: data[2] & 0x7F,
                select: (data[2] & 0x80) != 0,
            },
            TypeId::SetpointScaled => Self::SetpointScaled {
                value: i16_at(0),
                qualifier: data[2] & 0x7F,
                select: (data[2] & 0x80) != 0,
            },
            TypeId::SetpointFloat => Self::SetpointFloat {
                value: f32_at(0),
                qualifier: data[4] & 0x7F,
                select: (data[4] & 0x80) != 0,
            },
            TypeId::SingleCommandTime => Self::SingleCommandTime {
                on: (data[0] & 0x01) != 0,
                qualifier: (data[0] >> 2) & 0x1F,
                select: (data[0] & 0x80) != 0,
                time: time_at(1)?,
            },
            TypeId::DoubleCommandTime => Self::DoubleCommandTime {
                state: data[0] & 0x03,
                qualifier: (data[0] >> 2) & 0x1F,
                select: (data[0] & 0x80) != 0,
                time: time_at(1)?,
            },
            TypeId::RegulatingStepCommandTime => Self::RegulatingStepTime {
                step: data[0] & 0x03,
                qualifier: (data[0] >> 2) & 0x1F,
                select: (data[0] & 0x80) != 0,
                time: time_at(1)?,
            },
            TypeId::SetpointNormalizedTime => Self::SetpointNormalizedTime {
                value: i16_at(0),
                qualifier: data[2] & 0x7F,
                select: (data[2] & 0x80) != 0,
                time: time_at(3)?,
            },
            TypeId::SetpointScaledTime => Self::SetpointScaledTime {
                value: i16_at(0),
                qualifier: data[2] & 0x7F,
                select: (data[2] & 0x80) != 0,
                time: time_at(3)?,
            },
            TypeId::SetpointFloatTime => Self::SetpointFloatTime {
                value: f32_at(0),
                qualifier: data[4] & 0x7F,
                select: (data[4] & 0x80) != 0,
                time: time_at(5)?,
            },
            TypeId::EndOfInit => Self::EndOfInit {
                cause: data[0] & 0x7F,
                after_parameter_change: (data[0] & 0x80) != 0,
            },
            TypeId::InterrogationCommand => Self::Interrogation {
                qualifier: data[0],
            },
            TypeId::CounterInterrogation => Self::CounterInterrogation {
                request: data[0] & 0x3F,
                freeze: (data[0] >> 6) & 0x03,
            },
            TypeId::ReadCommand => Self::Read,
            TypeId::ClockSync => Self::ClockSync { time: time_at(0)? },
            TypeId::ResetProcess => Self::ResetProcess {
                qualifier: data[0],
            },
            TypeId::TestCommandTime => Self::TestCommand {
                counter: u16_at(0),
                time: time_at(2)?,
            },
            TypeId::ParameterNormalized => Self::ParameterNormalized {
                value: i16_at(0),
                kind: data[2] & 0x3F,
                in_operation: (data[2] & 0x40) != 0,
                local_change: (data[2] & 0x80) != 0,
            },
            TypeId::ParameterScaled => Self::ParameterScaled {
                value: i16_at(0),
                kind: data[2] & 0x3F,
                in_operation: (data[2] & 0x40) != 0,
                local_change: (data[2] & 0x80) != 0,
            },
            TypeId::ParameterFloat => Self::ParameterFloat {
                value: f32_at(0),
                kind: data[4] & 0x3F,
                in_operation: (data[4] & 0x40) != 0,
                local_change: (data[4] & 0x80) != 0,
            },
            TypeId::ParameterActivation => Self::ParameterActivation {
                qualifier: data[0],
            },
        })
    }

    /// Encode the body into the buffer.
    pub fn encode_body(&self, buf: &mut BytesMut) {
        use ObjectValue::*;

        let put_time = |buf: &mut BytesMut, t: &Cp56Time2a| buf.put_slice(&t.to_bytes());
        let command_byte =
            |low: u8, qualifier: u8, select: bool| low | (qualifier & 0x1F) << 2 | (select as u8) << 7;
        let qos_byte = |qualifier: u8, select: bool| (qualifier & 0x7F) | (select as u8) << 7;

        match self {
            SinglePoint { on, quality } => buf.put_u8(*on as u8 | quality.high_bits()),
            DoublePoint { state, quality } => buf.put_u8(*state as u8 | quality.high_bits()),
            StepPosition {
                value,
                transient,
                quality,
            } => {
                buf.put_u8((*value as u8 & 0x7F) | (*transient as u8) << 7);
                buf.put_u8(quality.qds_byte());
            }
            Bitstring32 { bits, quality } => {
                buf.put_u32_le(*bits);
                buf.put_u8(quality.qds_byte());
            }
            MeasuredNormalized { value, quality } | MeasuredScaled { value, quality } => {
                buf.put_i16_le(*value);
                buf.put_u8(quality.qds_byte());
            }
            MeasuredFloat { value, quality } => {
                buf.put_f32_le(*value);
                buf.put_u8(quality.qds_byte());
            }
            IntegratedTotals { counter } => counter.encode(buf),
            PackedSinglePoint {
                status,
                changes,
                quality,
            } => {
                buf.put_u16_le(*status);
                buf.put_u16_le(*changes);
                buf.put_u8(quality.qds_byte());
            }
            MeasuredNormalizedNoQuality { value } => buf.put_i16_le(*value),
            SinglePointTime { on, quality, time } => {
                buf.put_u8(*on as u8 | quality.high_bits());
                put_time(buf, time);
            }
            DoublePointTime {
                state,
                quality,
                time,
            } => {
                buf.put_u8(*state as u8 | quality.high_bits());
                put_time(buf, time);
            }
            StepPositionTime {
                value,
                transient,
                quality,
                time,
            } => {
                buf.put_u8((*value as u8 & 0x7F) | (*transient as u8) << 7);
                buf.put_u8(quality.qds_byte());
                put_time(buf, time);
            }
            Bitstring32Time {
                bits,
                quality,
                time,
            } => {
                buf.put_u32_le(*bits);
                buf.put_u8(quality.qds_byte());
                put_time(buf, time);
            }
            MeasuredNormalizedTime {
                value,
                quality,
                time,
            }
            | MeasuredScaledTime {
                value,
                quality,
                time,
            } => {
                buf.put_i16_le(*value);
                buf.put_u8(quality.qds_byte());
                put_time(buf, time);
            }
            MeasuredFloatTime {
                value,
                quality,
                time,
            } => {
                buf.put_f32_le(*value);
                buf.put_u8(quality.qds_byte());
                put_time(buf, time);
            }
            IntegratedTotalsTime { counter, time } => {
                counter.encode(buf);
                put_time(buf, time);
            }
            ProtectionEventTime {
                state,
                elapsed_invalid,
                quality,
                elapsed_ms,
                time,
            } => {
                buf.put_u8(*state as u8 | (*elapsed_invalid as u8) << 3 | quality.high_bits());
                buf.put_u16_le(*elapsed_ms);
                put_time(buf, time);
            }
            ProtectionStartEventsTime {
                events,
                elapsed_invalid,
                quality,
                elapsed_ms,
                time,
            } => {
                buf.put_u8(events.to_byte());
                buf.put_u8((*elapsed_invalid as u8) << 3 | quality.high_bits());
                buf.put_u16_le(*elapsed_ms);
                put_time(buf, time);
            }
            ProtectionOutputCircuitTime {
                circuits,
                elapsed_invalid,
                quality,
                elapsed_ms,
                time,
            } => {
                buf.put_u8(circuits.to_byte());
                buf.put_u8((*elapsed_invalid as u8) << 3 | quality.high_bits());
                buf.put_u16_le(*elapsed_ms);
                put_time(buf, time);
            }
            SingleCommand {
                on,
                qualifier,
                select,
            } => buf.put_u8(command_byte(*on as u8, *qualifier, *select)),
            DoubleCommand {
                state,
                qualifier,
                select,
            } => buf.put_u8(command_byte(state & 0x03, *qualifier, *select)),
            RegulatingStep {
                step,
                qualifier,
                select,
            } => buf.put_u8(command_byte(step & 0x03, *qualifier, *select)),
            SetpointNormalized {
                value,
                qualifier,
                select,
            }
            | SetpointScaled {
                value,
                qualifier,
                select,
            } => {
                buf.put_i16_le(*value);
                buf.put_u8(qos_byte(*qualifier, *select));
            }
            SetpointFloat {
                value,
                qualifier,
                select,
            } => {
                buf.put_f32_le(*value);
                buf.put_u8(qos_byte(*qualifier, *select));
            }
            SingleCommandTime {
                on,
                qualifier,
                select,
                time,
            } => {
                buf.put_u8(command_byte(*on as u8, *qualifier, *select));
                put_time(buf, time);
            }
            DoubleCommandTime {
                state,
                qualifier,
                select,
                time,
            } => {
                buf.put_u8(command_byte(state & 0x03, *qualifier, *select));
                put_time(buf, time);
            }
            RegulatingStepTime {
                step,
                qualifier,
                select,
                time,
            } => {
                buf.put_u8(command_byte(step & 0x03, *qualifier, *select));
                put_time(buf, time);
            }
            SetpointNormalizedTime {
                value,
                qualifier,
                select,
                time,
            }
            | SetpointScaledTime {
                value,
                qualifier,
                select,
                time,
            } => {
                buf.put_i16_le(*value);
                buf.put_u8(qos_byte(*qualifier, *select));
                put_time(buf, time);
            }
            SetpointFloatTime {
                value,
                qualifier,
                select,
                time,
            } => {
                buf.put_f32_le(*value);
                buf.put_u8(qos_byte(*qualifier, *select));
                put_time(buf, time);
            }
            EndOfInit {
                cause,
                after_parameter_change,
            } => buf.put_u8((cause & 0x7F) | (*after_parameter_change as u8) << 7),
            Interrogation { qualifier } => buf.put_u8(*qualifier),
            CounterInterrogation { request, freeze } => {
                buf.put_u8((request & 0x3F) | (freeze & 0x03) << 6)
            }
            Read => {}
            ClockSync { time } => put_time(buf, time),
            ResetProcess { qualifier } => buf.put_u8(*qualifier),
            TestCommand { counter, time } => {
                buf.put_u16_le(*counter);
                put_time(buf, time);
            }
            ParameterNormalized {
                value,
                kind,
                in_operation,
                local_change,
            }
            | ParameterScaled {
                value,
                kind,
                in_operation,
                local_change,
            } => {
                buf.put_i16_le(*value);
                buf.put_u8((kind & 0x3F) | (*in_operation as u8) << 6 | (*local_change as u8) << 7);
            }
            ParameterFloat {
                value,
                kind,
                in_operation,
                local_change,
            } => {
                buf.put_f32_le(*value);
                buf.put_u8((kind & 0x3F) | (*in_operation as u8) << 6 | (*local_change as u8) << 7);
            }
            ParameterActivation { qualifier } => buf.put_u8(*qualifier),
        }
    }

    /// Quality descriptor, for the types that carry one.
    pub const fn quality(&self) -> Option<&Quality> {
        use ObjectValue::*;
        match self {
            SinglePoint { quality, .. }
            | DoublePoint { quality, .. }
            | StepPosition { quality, .. }
            | Bitstring32 { quality, .. }
            | MeasuredNormalized { quality, .. }
            | MeasuredScaled { quality, .. }
            | MeasuredFloat { quality, .. }
            | PackedSinglePoint { quality, .. }
            | SinglePointTime { quality, .. }
            | DoublePointTime { quality, .. }
            | StepPositionTime { quality, .. }
            | Bitstring32Time { quality, .. }
            | MeasuredNormalizedTime { quality, .. }
            | MeasuredScaledTime { quality, .. }
            | MeasuredFloatTime { quality, .. }
            | ProtectionEventTime { quality, .. }
            | ProtectionStartEventsTime { quality, .. }
            | ProtectionOutputCircuitTime { quality, .. } => Some(quality),
            _ => None,
        }
    }

    /// Time tag, for the types that carry one.
    pub const fn time_tag(&self) -> Option<&Cp56Time2a> {
        use ObjectValue::*;
        match self {
            SinglePointTime { time, .. }
            | DoublePointTime { time, .. }
            | StepPositionTime { time, .. }
            | Bitstring32Time { time, .. }
            | MeasuredNormalizedTime { time, .. }
            | MeasuredScaledTime { time, .. }
            | MeasuredFloatTime { time, .. }
            | IntegratedTotalsTime { time, .. }
            | ProtectionEventTime { time, .. }
            | ProtectionStartEventsTime { time, .. }
            | ProtectionOutputCircuitTime { time, .. }
            | SingleCommandTime { time, .. }
            | DoubleCommandTime { time, .. }
            | RegulatingStepTime { time, .. }
            | SetpointNormalizedTime { time, .. }
            | SetpointScaledTime { time, .. }
            | SetpointFloatTime { time, .. }
            | ClockSync { time }
            | TestCommand { time, .. } => Some(time),
            _ => None,
        }
    }

    /// Overwrite the time tag on a timed variant; no-op otherwise.
    pub fn set_time_tag(&mut self, tag: Cp56Time2a) {
        use ObjectValue::*;
        match self {
            SinglePointTime { time, .. }
            | DoublePointTime { time, .. }
            | StepPositionTime { time, .. }
            | Bitstring32Time { time, .. }
            | MeasuredNormalizedTime { time, .. }
            | MeasuredScaledTime { time, .. }
            | MeasuredFloatTime { time, .. }
            | IntegratedTotalsTime { time, .. }
            | ProtectionEventTime { time, .. }
            | ProtectionStartEventsTime { time, .. }
            | ProtectionOutputCircuitTime { time, .. }
            | SingleCommandTime { time, .. }
            | DoubleCommandTime { time, .. }
            | RegulatingStepTime { time, .. }
            | SetpointNormalizedTime { time, .. }
            | SetpointScaledTime { time, .. }
            | SetpointFloatTime { time, .. }
            | ClockSync { time }
            | TestCommand { time, .. } => *time = tag,
            _ => {}
        }
    }

    /// Numeric rendering of the carried value, for traces and dashboards.
    pub fn scalar(&self) -> f64 {
        use ObjectValue::*;
        match self {
            SinglePoint { on, .. } | SinglePointTime { on, .. } => *on as u8 as f64,
            DoublePoint { state, .. } | DoublePointTime { state, .. } => *state as u8 as f64,
            StepPosition { value, .. } | StepPositionTime { value, .. } => *value as f64,
            Bitstring32 { bits, .. } | Bitstring32Time { bits, .. } => *bits as f64,
            MeasuredNormalized { value, .. }
            | MeasuredScaled { value, .. }
            | MeasuredNormalizedNoQuality { value }
            | MeasuredNormalizedTime { value, .. }
            | MeasuredScaledTime { value, .. } => *value as f64,
            MeasuredFloat { value, .. } | MeasuredFloatTime { value, .. } => *value as f64,
            IntegratedTotals { counter } | IntegratedTotalsTime { counter, .. } => {
                counter.value as f64
            }
            PackedSinglePoint { status, .. } => *status as f64,
            ProtectionEventTime { state, .. } => *state as u8 as f64,
            ProtectionStartEventsTime { events, .. } => events.general as u8 as f64,
            ProtectionOutputCircuitTime { circuits, .. } => circuits.general as u8 as f64,
            SingleCommand { on, .. } | SingleCommandTime { on, .. } => *on as u8 as f64,
            DoubleCommand { state, .. } | DoubleCommandTime { state, .. } => *state as f64,
            RegulatingStep { step, .. } | RegulatingStepTime { step, .. } => *step as f64,
            SetpointNormalized { value, .. }
            | SetpointScaled { value, .. }
            | SetpointNormalizedTime { value, .. }
            | SetpointScaledTime { value, .. } => *value as f64,
            SetpointFloat { value, .. } | SetpointFloatTime { value, .. } => *value as f64,
            EndOfInit { cause, .. } => *cause as f64,
            Interrogation { qualifier } | ResetProcess { qualifier }
            | ParameterActivation { qualifier } => *qualifier as f64,
            CounterInterrogation { request, .. } => *request as f64,
            Read => 0.0,
            ClockSync { .. } => 0.0,
            TestCommand { counter, .. } => *counter as f64,
            ParameterNormalized { value, .. } | ParameterScaled { value, .. } => *value as f64,
            ParameterFloat { value, .. } => *value as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeId;

    fn roundtrip(value: ObjectValue) {
        let type_id = value.type_id();
        let mut buf = BytesMut::new();
        value.encode_body(&mut buf);
        assert_eq!(
            buf.len(),
            ObjectValue::body_len(type_id),
            "body length mismatch for {type_id}"
        );
        let decoded = ObjectValue::decode_body(type_id, &buf).unwrap();
        assert_eq!(decoded, value, "roundtrip mismatch for {type_id}");
    }

    fn sample_time() -> Cp56Time2a {
        Cp56Time2a {
            milliseconds: 45_123,
            minutes: 30,
            hours: 9,
            day: 15,
            day_of_week: 1,
            month: 7,
            year: 24,
            invalid: false,
            summer_time: true,
        }
    }

    #[test]
    fn roundtrip_every_type() {
        let q = Quality {
            blocked: true,
            invalid: true,
            ..Quality::GOOD
        };
        let qov = Quality {
            overflow: true,
            not_topical: true,
            ..Quality::GOOD
        };
        let counter = BinaryCounter {
            value: 123_456,
            sequence: 5,
            carry: true,
            adjusted: false,
            invalid: false,
        };
        let t = sample_time();

        for value in [
            ObjectValue::SinglePoint { on: true, quality: q },
            ObjectValue::DoublePoint {
                state: DoublePointState::On,
                quality: q,
            },
            ObjectValue::StepPosition {
                value: -33,
                transient: true,
                quality: qov,
            },
            ObjectValue::Bitstring32 {
                bits: 0xDEAD_BEEF,
                quality: qov,
            },
            ObjectValue::MeasuredNormalized {
                value: -16384,
                quality: qov,
            },
            ObjectValue::MeasuredScaled {
                value: 1000,
                quality: Quality::GOOD,
            },
            ObjectValue::MeasuredFloat {
                value: 23.5,
                quality: qov,
            },
            ObjectValue::IntegratedTotals { counter },
            ObjectValue::PackedSinglePoint {
                status: 0xA5A5,
                changes: 0x0F0F,
                quality: qov,
            },
            ObjectValue::MeasuredNormalizedNoQuality { value: 77 },
            ObjectValue::SinglePointTime {
                on: false,
                quality: q,
                time: t,
            },
            ObjectValue::DoublePointTime {
                state: DoublePointState::Off,
                quality: q,
                time: t,
            },
            ObjectValue::StepPositionTime {
                value: 63,
                transient: false,
                quality: qov,
                time: t,
            },
            ObjectValue::Bitstring32Time {
                bits: 1,
                quality: qov,
                time: t,
            },
            ObjectValue::MeasuredNormalizedTime {
                value: 0,
                quality: qov,
                time: t,
            },
            ObjectValue::MeasuredScaledTime {
                value: -1,
                quality: qov,
                time: t,
            },
            ObjectValue::MeasuredFloatTime {
                value: -0.5,
                quality: qov,
                time: t,
            },
            ObjectValue::IntegratedTotalsTime { counter, time: t },
            ObjectValue::ProtectionEventTime {
                state: DoublePointState::On,
                elapsed_invalid: true,
                quality: q,
                elapsed_ms: 350,
                time: t,
            },
            ObjectValue::ProtectionStartEventsTime {
                events: StartEvents {
                    general: true,
                    l2: true,
                    earth: true,
                    ..StartEvents::default()
                },
                elapsed_invalid: false,
                quality: q,
                elapsed_ms: 20,
                time: t,
            },
            ObjectValue::ProtectionOutputCircuitTime {
                circuits: OutputCircuits {
                    general: true,
                    l3: true,
                    ..OutputCircuits::default()
                },
                elapsed_invalid: true,
                quality: q,
                elapsed_ms: 65535,
                time: t,
            },
            ObjectValue::SingleCommand {
                on: true,
                qualifier: 0,
                select: true,
            },
            ObjectValue::DoubleCommand {
                state: 2,
                qualifier: 1,
                select: false,
            },
            ObjectValue::RegulatingStep {
                step: 1,
                qualifier: 31,
                select: true,
            },
            ObjectValue::SetpointNormalized {
                value: -100,
                qualifier: 0,
                select: false,
            },
            ObjectValue::SetpointScaled {
                value: 500,
                qualifier: 127,
                select: true,
            },
            ObjectValue::SetpointFloat {
                value: 3.25,
                qualifier: 0,
                select: false,
            },
            ObjectValue::SingleCommandTime {
                on: false,
                qualifier: 2,
                select: true,
                time: t,
            },
            ObjectValue::DoubleCommandTime {
                state: 1,
                qualifier: 0,
                select: false,
                time: t,
            },
            ObjectValue::RegulatingStepTime {
                step: 2,
                qualifier: 0,
                select: false,
                time: t,
            },
            ObjectValue::SetpointNormalizedTime {
                value: 1,
                qualifier: 0,
                select: true,
                time: t,
            },
            ObjectValue::SetpointScaledTime {
                value: -2,
                qualifier: 3,
                select: false,
                time: t,
            },
            ObjectValue::SetpointFloatTime {
                value: 0.0,
                qualifier: 0,
                select: true,
                time: t,
            },
            ObjectValue::EndOfInit {
                cause: 2,
                after_parameter_change: true,
            },
            ObjectValue::Interrogation { qualifier: 20 },
            ObjectValue::CounterInterrogation {
                request: 5,
                freeze: 2,
            },
            ObjectValue::Read,
            ObjectValue::ClockSync { time: t },
            ObjectValue::ResetProcess { qualifier: 1 },
            ObjectValue::TestCommand {
                counter: 0x0042,
                time: t,
            },
            ObjectValue::ParameterNormalized {
                value: 12,
                kind: 1,
                in_operation: true,
                local_change: false,
            },
            ObjectValue::ParameterScaled {
                value: -12,
                kind: 3,
                in_operation: false,
                local_change: true,
            },
            ObjectValue::ParameterFloat {
                value: 1.5,
                kind: 4,
                in_operation: false,
                local_change: false,
            },
            ObjectValue::ParameterActivation { qualifier: 1 },
        ] {
            roundtrip(value);
        }
    }

    #[test]
    fn siq_bit_layout() {
        // on + BL + IV
        let v = ObjectValue::decode_body(TypeId::SinglePoint, &[0x91]).unwrap();
        match v {
            ObjectValue::SinglePoint { on, quality } => {
                assert!(on);
                assert!(quality.blocked);
                assert!(quality.invalid);
                assert!(!quality.substituted);
                assert!(!quality.overflow);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn qds_overflow_bit() {
        let v = ObjectValue::decode_body(
            TypeId::MeasuredFloat,
            &[0x00, 0x00, 0x00, 0x00, 0x81],
        )
        .unwrap();
        let q = v.quality().unwrap();
        assert!(q.overflow);
        assert!(q.invalid);
    }

    #[test]
    fn vti_sign_extension() {
        // -64 is 0x40 in 7-bit two's complement
        let v = ObjectValue::decode_body(TypeId::StepPosition, &[0x40, 0x00]).unwrap();
        assert!(matches!(
            v,
            ObjectValue::StepPosition { value: -64, transient: false, .. }
        ));
        // +63 with transient bit
        let v = ObjectValue::decode_body(TypeId::StepPosition, &[0xBF, 0x00]).unwrap();
        assert!(matches!(
            v,
            ObjectValue::StepPosition { value: 63, transient: true, .. }
        ));
    }

    #[test]
    fn sco_bit_layout() {
        // scs=1, qu=0, se=1 per the select/execute scenario
        let mut buf = BytesMut::new();
        ObjectValue::SingleCommand {
            on: true,
            qualifier: 0,
            select: true,
        }
        .encode_body(&mut buf);
        assert_eq!(&buf[..], &[0x81]);

        // qu lands in bits 2..6
        let mut buf = BytesMut::new();
        ObjectValue::SingleCommand {
            on: false,
            qualifier: 3,
            select: false,
        }
        .encode_body(&mut buf);
        assert_eq!(&buf[..], &[0x0C]);
    }

    #[test]
    fn bcr_flags() {
        let v = ObjectValue::decode_body(
            TypeId::IntegratedTotals,
            &[0x40, 0xE2, 0x01, 0x00, 0xA5],
        )
        .unwrap();
        match v {
            ObjectValue::IntegratedTotals { counter } => {
                assert_eq!(counter.value, 123_456);
                assert_eq!(counter.sequence, 5);
                assert!(counter.carry);
                assert!(!counter.adjusted);
                assert!(counter.invalid);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn protection_event_elapsed_field_precedes_time() {
        let t = sample_time();
        let mut buf = BytesMut::new();
        ObjectValue::ProtectionEventTime {
            state: DoublePointState::On,
            elapsed_invalid: false,
            quality: Quality::GOOD,
            elapsed_ms: 0x1234,
            time: t,
        }
        .encode_body(&mut buf);
        assert_eq!(buf.len(), 10);
        assert_eq!(buf[0], 0x02);
        assert_eq!(&buf[1..3], &[0x34, 0x12]);
        assert_eq!(&buf[3..10], &t.to_bytes());
    }

    #[test]
    fn short_body_rejected() {
        assert!(ObjectValue::decode_body(TypeId::MeasuredFloat, &[0x00, 0x00]).is_err());
        assert!(ObjectValue::decode_body(TypeId::SinglePointTime, &[0x01]).is_err());
    }

    #[test]
    fn qcc_fields() {
        let v = ObjectValue::decode_body(TypeId::CounterInterrogation, &[0xC5]).unwrap();
        assert!(matches!(
            v,
            ObjectValue::CounterInterrogation { request: 5, freeze: 3 }
        ));
    }

    #[test]
    fn set_time_tag_only_touches_timed_variants() {
        let t = sample_time();
        let mut cmd = ObjectValue::SingleCommandTime {
            on: true,
            qualifier: 0,
            select: false,
            time: Cp56Time2a::ZERO,
        };
        cmd.set_time_tag(t);
        assert_eq!(cmd.time_tag(), Some(&t));

        let mut plain = ObjectValue::SingleCommand {
            on: true,
            qualifier: 0,
            select: false,
        };
        plain.set_time_tag(t);
        assert_eq!(plain.time_tag(), None);
    }

    #[test]
    fn quality_display_order() {
        let q = Quality {
            overflow: true,
            blocked: true,
            substituted: true,
            not_topical: true,
            invalid: true,
        };
        assert_eq!(q.to_string(), "ov bl nt sb iv ");
        assert_eq!(Quality::GOOD.to_string(), "");
    }
}
