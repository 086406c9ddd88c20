//! Type identification: which object layout an ASDU carries.

use crate::error::{Iec104Error, Result};

/// The closed set of type identifications this station encodes and decodes.
///
/// File transfer (120–126) and the 24-bit-time variants are deliberately
/// absent; anything outside the set is traced and dropped on receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeId {
    // Process information, monitor direction, no time tag
    /// Single-point information (M_SP_NA_1)
    SinglePoint = 1,
    /// Double-point information (M_DP_NA_1)
    DoublePoint = 3,
    /// Step position information (M_ST_NA_1)
    StepPosition = 5,
    /// Bitstring of 32 bit (M_BO_NA_1)
    Bitstring32 = 7,
    /// Measured value, normalized (M_ME_NA_1)
    MeasuredNormalized = 9,
    /// Measured value, scaled (M_ME_NB_1)
    MeasuredScaled = 11,
    /// Measured value, short floating point (M_ME_NC_1)
    MeasuredFloat = 13,
    /// Integrated totals (M_IT_NA_1)
    IntegratedTotals = 15,
    /// Packed single-point information with status change detection (M_PS_NA_1)
    PackedSinglePoint = 20,
    /// Measured value, normalized, without quality descriptor (M_ME_ND_1)
    MeasuredNormalizedNoQuality = 21,

    // Process information, monitor direction, CP56Time2a tagged
    /// Single-point information with time tag (M_SP_TB_1)
    SinglePointTime = 30,
    /// Double-point information with time tag (M_DP_TB_1)
    DoublePointTime = 31,
    /// Step position information with time tag (M_ST_TB_1)
    StepPositionTime = 32,
    /// Bitstring of 32 bit with time tag (M_BO_TB_1)
    Bitstring32Time = 33,
    /// Measured value, normalized, with time tag (M_ME_TD_1)
    MeasuredNormalizedTime = 34,
    /// Measured value, scaled, with time tag (M_ME_TE_1)
    MeasuredScaledTime = 35,
    /// Measured value, short floating point, with time tag (M_ME_TF_1)
    MeasuredFloatTime = 36,
    /// Integrated totals with time tag (M_IT_TB_1)
    IntegratedTotalsTime = 37,
    /// Event of protection equipment with time tag (M_EP_TD_1)
    ProtectionEventTime = 38,
    /// Packed start events of protection equipment with time tag (M_EP_TE_1)
    ProtectionStartEventsTime = 39,
    /// Packed output circuit information of protection equipment with time tag (M_EP_TF_1)
    ProtectionOutputCircuitTime = 40,

    // Process information, control direction
    /// Single command (C_SC_NA_1)
    SingleCommand = 45,
    /// Double command (C_DC_NA_1)
    DoubleCommand = 46,
    /// Regulating step command (C_RC_NA_1)
    RegulatingStepCommand = 47,
    /// Set-point command, normalized (C_SE_NA_1)
    SetpointNormalized = 48,
    /// Set-point command, scaled (C_SE_NB_1)
    SetpointScaled = 49,
    /// Set-point command, short floating point (C_SE_NC_1)
    SetpointFloat = 50,
    /// Single command with time tag (C_SC_TA_1)
    SingleCommandTime = 58,
    /// Double command with time tag (C_DC_TA_1)
    DoubleCommandTime = 59,
    /// Regulating step command with time tag (C_RC_TA_1)
    RegulatingStepCommandTime = 60,
    /// Set-point command, normalized, with time tag (C_SE_TA_1)
    SetpointNormalizedTime = 61,
    /// Set-point command, scaled, with time tag (C_SE_TB_1)
    SetpointScaledTime = 62,
    /// Set-point command, short floating point, with time tag (C_SE_TC_1)
    SetpointFloatTime = 63,

    // System information
    /// End of initialization (M_EI_NA_1)
    EndOfInit = 70,
    /// (General) interrogation command (C_IC_NA_1)
    InterrogationCommand = 100,
    /// Counter interrogation command (C_CI_NA_1)
    CounterInterrogation = 101,
    /// Read command (C_RD_NA_1)
    ReadCommand = 102,
    /// Clock synchronization command (C_CS_NA_1)
    ClockSync = 103,
    /// Reset process command (C_RP_NA_1)
    ResetProcess = 105,
    /// Test command with time tag (C_TS_TA_1)
    TestCommandTime = 107,

    // Parameters
    /// Parameter of measured value, normalized (P_ME_NA_1)
    ParameterNormalized = 110,
    /// Parameter of measured value, scaled (P_ME_NB_1)
    ParameterScaled = 111,
    /// Parameter of measured value, short floating point (P_ME_NC_1)
    ParameterFloat = 112,
    /// Parameter activation (P_AC_NA_1)
    ParameterActivation = 113,
}

impl TypeId {
    /// Decode from the raw octet.
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            1 => Self::SinglePoint,
            3 => Self::DoublePoint,
            5 => Self::StepPosition,
            7 => Self::Bitstring32,
            9 => Self::MeasuredNormalized,
            11 => Self::MeasuredScaled,
            13 => Self::MeasuredFloat,
            15 => Self::IntegratedTotals,
            20 => Self::PackedSinglePoint,
            21 => Self::MeasuredNormalizedNoQuality,
            30 => Self::SinglePointTime,
            31 => Self::DoublePointTime,
            32 => Self::StepPositionTime,
            33 => Self::Bitstring32Time,
            34 => Self::MeasuredNormalizedTime,
            35 => Self::MeasuredScaledTime,
            36 => Self::MeasuredFloatTime,
            37 => Self::IntegratedTotalsTime,
            38 => Self::ProtectionEventTime,
            39 => Self::ProtectionStartEventsTime,
            40 => Self::ProtectionOutputCircuitTime,
            45 => Self::SingleCommand,
            46 => Self::DoubleCommand,
            47 => Self::RegulatingStepCommand,
            48 => Self::SetpointNormalized,
            49 => Self::SetpointScaled,
            50 => Self::SetpointFloat,
            58 => Self::SingleCommandTime,
            59 => Self::DoubleCommandTime,
            60 => Self::RegulatingStepCommandTime,
            61 => Self::SetpointNormalizedTime,
            62 => Self::SetpointScaledTime,
            63 => Self::SetpointFloatTime,
            70 => Self::EndOfInit,
            100 => Self::InterrogationCommand,
            101 => Self::CounterInterrogation,
            102 => Self::ReadCommand,
            103 => Self::ClockSync,
            105 => Self::ResetProcess,
            107 => Self::TestCommandTime,
            110 => Self::ParameterNormalized,
            111 => Self::ParameterScaled,
            112 => Self::ParameterFloat,
            113 => Self::ParameterActivation,
            _ => return Err(Iec104Error::UnknownTypeId(value)),
        })
    }

    /// Raw octet value.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Monitor direction (controlled station → us).
    #[inline]
    pub const fn is_monitor(self) -> bool {
        matches!(self.as_u8(), 1..=40 | 70)
    }

    /// Monitor process information that feeds the data indication path.
    #[inline]
    pub const fn is_monitor_process(self) -> bool {
        matches!(self.as_u8(), 1..=40)
    }

    /// Control direction (us → controlled station), including parameters.
    #[inline]
    pub const fn is_control(self) -> bool {
        matches!(self.as_u8(), 45..=63 | 100..=107 | 110..=113)
    }

    /// Command or parameter types whose echoes go to the command response
    /// indication.
    #[inline]
    pub const fn is_command_like(self) -> bool {
        matches!(self.as_u8(), 45..=63 | 101..=105 | 110..=113)
    }

    /// Object body ends with a CP56Time2a tag.
    #[inline]
    pub const fn has_time_tag(self) -> bool {
        matches!(self.as_u8(), 30..=40 | 58..=63 | 103 | 107)
    }

    /// IEC companion-standard mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::SinglePoint => "M_SP_NA_1",
            Self::DoublePoint => "M_DP_NA_1",
            Self::StepPosition => "M_ST_NA_1",
            Self::Bitstring32 => "M_BO_NA_1",
            Self::MeasuredNormalized => "M_ME_NA_1",
            Self::MeasuredScaled => "M_ME_NB_1",
            Self::MeasuredFloat => "M_ME_NC_1",
            Self::IntegratedTotals => "M_IT_NA_1",
            Self::PackedSinglePoint => "M_PS_NA_1",
            Self::MeasuredNormalizedNoQuality => "M_ME_ND_1",
            Self::SinglePointTime => "M_SP_TB_1",
            Self::DoublePointTime => "M_DP_TB_1",
            Self::StepPositionTime => "M_ST_TB_1",
            Self::Bitstring32Time => "M_BO_TB_1",
            Self::MeasuredNormalizedTime => "M_ME_TD_1",
            Self::MeasuredScaledTime => "M_ME_TE_1",
            Self::MeasuredFloatTime => "M_ME_TF_1",
            Self::IntegratedTotalsTime => "M_IT_TB_1",
            Self::ProtectionEventTime => "M_EP_TD_1",
            Self::ProtectionStartEventsTime => "M_EP_TE_1",
            Self::ProtectionOutputCircuitTime => "M_EP_TF_1",
            Self::SingleCommand => "C_SC_NA_1",
            Self::DoubleCommand => "C_DC_NA_1",
            Self::RegulatingStepCommand => "C_RC_NA_1",
            Self::SetpointNormalized => "C_SE_NA_1",
            Self::SetpointScaled => "C_SE_NB_1",
            Self::SetpointFloat => "C_SE_NC_1",
            Self::SingleCommandTime => "C_SC_TA_1",
            Self::DoubleCommandTime => "C_DC_TA_1",
            Self::RegulatingStepCommandTime => "C_RC_TA_1",
            Self::SetpointNormalizedTime => "C_SE_TA_1",
            Self::SetpointScaledTime => "C_SE_TB_1",
            Self::SetpointFloatTime => "C_SE_TC_1",
            Self::EndOfInit => "M_EI_NA_1",
            Self::InterrogationCommand => "C_IC_NA_1",
            Self::CounterInterrogation => "C_CI_NA_1",
            Self::ReadCommand => "C_RD_NA_1",
            Self::ClockSync => "C_CS_NA_1",
            Self::ResetProcess => "C_RP_NA_1",
            Self::TestCommandTime => "C_TS_TA_1",
            Self::ParameterNormalized => "P_ME_NA_1",
            Self::ParameterScaled => "P_ME_NB_1",
            Self::ParameterFloat => "P_ME_NC_1",
            Self::ParameterActivation => "P_AC_NA_1",
        }
    }

    /// Trace name for an arbitrary raw octet, reserved ranges included.
    pub fn name_for_raw(value: u8) -> &'static str {
        match Self::from_u8(value) {
            Ok(ti) => ti.mnemonic(),
            Err(_) if value >= 127 => "USER_RESERVED",
            Err(_) => "STD_RESERVED",
        }
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
