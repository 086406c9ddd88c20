//! CP56Time2a: the 7-octet absolute timestamp used by time-tagged objects.

use chrono::{DateTime, Datelike, Local, Timelike};

use crate::error::{Iec104Error, Result};

/// CP56Time2a timestamp.
///
/// Wire layout, little-endian where multibyte: msec (u16, carries seconds
/// as milliseconds), {min:6, RES1:1, IV:1}, {hour:5, RES2:2, SU:1},
/// {mday:5, wday:3}, {month:4, RES3:4}, {year:7, RES4:1}. Reserved bits
/// are written zero and ignored on read. Year is offset from 2000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cp56Time2a {
    /// Milliseconds within the minute (0..=59999); whole seconds ride here
    pub milliseconds: u16,
    /// Minutes (0..=59)
    pub minutes: u8,
    /// Hours (0..=23)
    pub hours: u8,
    /// Day of month (1..=31)
    pub day: u8,
    /// Day of week (1=Monday..7=Sunday, 0 when not used)
    pub day_of_week: u8,
    /// Month (1..=12)
    pub month: u8,
    /// Years since 2000 (0..=99)
    pub year: u8,
    /// IV: timestamp invalid
    pub invalid: bool,
    /// SU: summer time
    pub summer_time: bool,
}

impl Cp56Time2a {
    /// All-zero tag. Outgoing commands carrying this value get stamped
    /// with the local clock by the sender.
    pub const ZERO: Self = Self {
        milliseconds: 0,
        minutes: 0,
        hours: 0,
        day: 0,
        day_of_week: 0,
        month: 0,
        year: 0,
        invalid: false,
        summer_time: false,
    };

    /// Whether every field is zero (no tag supplied).
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Decode from 7 octets.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 7 {
            return Err(Iec104Error::invalid_asdu_static("CP56Time2a too short"));
        }
        Ok(Self {
            milliseconds: u16::from_le_bytes([bytes[0], bytes[1]]),
            minutes: bytes[2] & 0x3F,
            invalid: (bytes[2] & 0x80) != 0,
            hours: bytes[3] & 0x1F,
            summer_time: (bytes[3] & 0x80) != 0,
            day: bytes[4] & 0x1F,
            day_of_week: (bytes[4] >> 5) & 0x07,
            month: bytes[5] & 0x0F,
            year: bytes[6] & 0x7F,
        })
    }

    /// Encode to 7 octets, reserved bits zero.
    pub fn to_bytes(&self) -> [u8; 7] {
        let [ms_lo, ms_hi] = self.milliseconds.to_le_bytes();
        [
            ms_lo,
            ms_hi,
            (self.minutes & 0x3F) | if self.invalid { 0x80 } else { 0 },
            (self.hours & 0x1F) | if self.summer_time { 0x80 } else { 0 },
            (self.day & 0x1F) | ((self.day_of_week & 0x07) << 5),
            self.month & 0x0F,
            self.year & 0x7F,
        ]
    }

    /// Build from a local wall-clock instant.
    ///
    /// The millisecond field carries `seconds * 1000` only; sub-second
    /// precision of the source instant is discarded, matching what the
    /// station writes into auto-stamped outgoing commands.
    pub fn from_datetime(dt: &DateTime<Local>) -> Self {
        Self {
            milliseconds: (dt.second() * 1000) as u16,
            minutes: dt.minute() as u8,
            hours: dt.hour() as u8,
            day: dt.day() as u8,
            day_of_week: dt.weekday().number_from_monday() as u8,
            month: dt.month() as u8,
            year: (dt.year() % 100) as u8,
            invalid: false,
            summer_time: false,
        }
    }

    /// Current local time.
    pub fn now_local() -> Self {
        Self::from_datetime(&Local::now())
    }

    /// Whole seconds within the minute.
    #[inline]
    pub const fn seconds(&self) -> u16 {
        self.milliseconds / 1000
    }

    /// Millisecond remainder within the second.
    #[inline]
    pub const fn subsec_millis(&self) -> u16 {
        self.milliseconds % 1000
    }
}

impl std::fmt::Display for Cp56Time2a {
    /// `yyyy/mm/dd hh:mm:ss.mmm` plus `.iv` / `.su` markers, trace form.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}/{:02}/{:02} {:02}:{:02}:{:02}.{:03}{}{}",
            self.year as u16 + 2000,
            self.month,
            self.day,
            self.hours,
            self.minutes,
            self.seconds(),
            self.subsec_millis(),
            if self.invalid { ".iv" } else { "" },
            if self.summer_time { ".su" } else { "" },
        )
    }
}
