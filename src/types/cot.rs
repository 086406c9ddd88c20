//! Cause of transmission: the 6-bit reason code in every ASDU header.

use crate::error::{Iec104Error, Result};

/// Cause of Transmission (COT).
///
/// Carried in the lower six bits of the third ASDU header octet; the P/N
/// and test flags that share the remaining bits live on [`super::AsduHeader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Cot {
    /// Periodic, cyclic (1)
    Periodic = 1,
    /// Background scan (2)
    Background = 2,
    /// Spontaneous (3)
    Spontaneous = 3,
    /// Initialized (4)
    Initialized = 4,
    /// Request or requested (5)
    Request = 5,
    /// Activation (6)
    Activation = 6,
    /// Activation confirmation (7)
    ActivationConfirm = 7,
    /// Deactivation (8)
    Deactivation = 8,
    /// Deactivation confirmation (9)
    DeactivationConfirm = 9,
    /// Activation termination (10)
    ActivationTermination = 10,
    /// Return information caused by a remote command (11)
    ReturnRemote = 11,
    /// Return information caused by a local command (12)
    ReturnLocal = 12,
    /// File transfer (13)
    FileTransfer = 13,
    /// Interrogated by station interrogation (20)
    InterrogatedByStation = 20,
    /// Interrogated by group 1 (21)
    InterrogatedByGroup1 = 21,
    /// Interrogated by group 2 (22)
    InterrogatedByGroup2 = 22,
    /// Interrogated by group 3 (23)
    InterrogatedByGroup3 = 23,
    /// Interrogated by group 4 (24)
    InterrogatedByGroup4 = 24,
    /// Interrogated by group 5 (25)
    InterrogatedByGroup5 = 25,
    /// Interrogated by group 6 (26)
    InterrogatedByGroup6 = 26,
    /// Interrogated by group 7 (27)
    InterrogatedByGroup7 = 27,
    /// Interrogated by group 8 (28)
    InterrogatedByGroup8 = 28,
    /// Interrogated by group 9 (29)
    InterrogatedByGroup9 = 29,
    /// Interrogated by group 10 (30)
    InterrogatedByGroup10 = 30,
    /// Interrogated by group 11 (31)
    InterrogatedByGroup11 = 31,
    /// Interrogated by group 12 (32)
    InterrogatedByGroup12 = 32,
    /// Interrogated by group 13 (33)
    InterrogatedByGroup13 = 33,
    /// Interrogated by group 14 (34)
    InterrogatedByGroup14 = 34,
    /// Interrogated by group 15 (35)
    InterrogatedByGroup15 = 35,
    /// Interrogated by group 16 (36)
    InterrogatedByGroup16 = 36,
    /// Requested by general counter request (37)
    RequestedByGeneralCounter = 37,
    /// Requested by group 1 counter request (38)
    RequestedByGroup1Counter = 38,
    /// Requested by group 2 counter request (39)
    RequestedByGroup2Counter = 39,
    /// Requested by group 3 counter request (40)
    RequestedByGroup3Counter = 40,
    /// Requested by group 4 counter request (41)
    RequestedByGroup4Counter = 41,
    /// Unknown type identification (44)
    UnknownTypeId = 44,
    /// Unknown cause of transmission (45)
    UnknownCot = 45,
    /// Unknown common address of ASDU (46)
    UnknownCommonAddress = 46,
    /// Unknown information object address (47)
    UnknownIoa = 47,
}

impl Cot {
    /// Decode from the header octet; the upper two bits (P/N, T) are masked.
    pub fn from_u8(value: u8) -> Result<Self> {
        let cause = value & 0x3F;
        Ok(match cause {
            1 => Self::Periodic,
            2 => Self::Background,
            3 => Self::Spontaneous,
            4 => Self::Initialized,
            5 => Self::Request,
            6 => Self::Activation,
            7 => Self::ActivationConfirm,
            8 => Self::Deactivation,
            9 => Self::DeactivationConfirm,
            10 => Self::ActivationTermination,
            11 => Self::ReturnRemote,
            12 => Self::ReturnLocal,
            13 => Self::FileTransfer,
            20 => Self::InterrogatedByStation,
            21 => Self::InterrogatedByGroup1,
            22 => Self::InterrogatedByGroup2,
            23 => Self::InterrogatedByGroup3,
            24 => Self::InterrogatedByGroup4,
            25 => Self::InterrogatedByGroup5,
            26 => Self::InterrogatedByGroup6,
            27 => Self::InterrogatedByGroup7,
            28 => Self::InterrogatedByGroup8,
            29 => Self::InterrogatedByGroup9,
            30 => Self::InterrogatedByGroup10,
            31 => Self::InterrogatedByGroup11,
            32 => Self::InterrogatedByGroup12,
            33 => Self::InterrogatedByGroup13,
            34 => Self::InterrogatedByGroup14,
            35 => Self::InterrogatedByGroup15,
            36 => Self::InterrogatedByGroup16,
            37 => Self::RequestedByGeneralCounter,
            38 => Self::RequestedByGroup1Counter,
            39 => Self::RequestedByGroup2Counter,
            40 => Self::RequestedByGroup3Counter,
            41 => Self::RequestedByGroup4Counter,
            44 => Self::UnknownTypeId,
            45 => Self::UnknownCot,
            46 => Self::UnknownCommonAddress,
            47 => Self::UnknownIoa,
            _ => return Err(Iec104Error::UnknownCause(cause)),
        })
    }

    /// Raw 6-bit value.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// True for the interrogation response band 20..=36 (station + groups).
    ///
    /// ASDUs carrying these causes count toward the running general
    /// interrogation object total.
    #[inline]
    pub const fn is_interrogation_response(self) -> bool {
        matches!(self.as_u8(), 20..=36)
    }

    /// True for the counter request response band 37..=41.
    #[inline]
    pub const fn is_counter_response(self) -> bool {
        matches!(self.as_u8(), 37..=41)
    }

    /// True for negative-diagnosis causes (44..=47).
    #[inline]
    pub const fn is_negative_diagnosis(self) -> bool {
        matches!(self.as_u8(), 44..=47)
    }

    /// Trace mnemonic in the station's log vocabulary.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Periodic => "CYCLIC",
            Self::Background => "BACKGND",
            Self::Spontaneous => "SPONT",
            Self::Initialized => "INIT",
            Self::Request => "REQ",
            Self::Activation => "ACT",
            Self::ActivationConfirm => "ACT_CON",
            Self::Deactivation => "DEACT",
            Self::DeactivationConfirm => "DEACT_CON",
            Self::ActivationTermination => "ACT_TERM",
            Self::ReturnRemote => "RETREM",
            Self::ReturnLocal => "RETLOC",
            Self::FileTransfer => "FILE",
            Self::InterrogatedByStation => "INROGEN",
            Self::InterrogatedByGroup1 => "INRO1",
            Self::InterrogatedByGroup2 => "INRO2",
            Self::InterrogatedByGroup3 => "INRO3",
            Self::InterrogatedByGroup4 => "INRO4",
            Self::InterrogatedByGroup5 => "INRO5",
            Self::InterrogatedByGroup6 => "INRO6",
            Self::InterrogatedByGroup7 => "INRO7",
            Self::InterrogatedByGroup8 => "INRO8",
            Self::InterrogatedByGroup9 => "INRO9",
            Self::InterrogatedByGroup10 => "INRO10",
            Self::InterrogatedByGroup11 => "INRO11",
            Self::InterrogatedByGroup12 => "INRO12",
            Self::InterrogatedByGroup13 => "INRO13",
            Self::InterrogatedByGroup14 => "INRO14",
            Self::InterrogatedByGroup15 => "INRO15",
            Self::InterrogatedByGroup16 => "INRO16",
            Self::RequestedByGeneralCounter => "REQCOGEN",
            Self::RequestedByGroup1Counter => "REQCO1",
            Self::RequestedByGroup2Counter => "REQCO2",
            Self::RequestedByGroup3Counter => "REQCO3",
            Self::RequestedByGroup4Counter => "REQCO4",
            Self::UnknownTypeId => "UNKNOWN_TYPE",
            Self::UnknownCot => "UNKNOWN_CAUSE",
            Self::UnknownCommonAddress => "UNKNOWN_ASDU_ADDR",
            Self::UnknownIoa => "UNKNOWN_OBJ_ADDR",
        }
    }
}

impl std::fmt::Display for Cot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
