//! ASDU: header plus information objects.
//!
//! Header wire form (6 octets): TypeID, VSQ {SQ:1, N:7}, cause octet
//! {T:1, P/N:1, Cause:6}, originator address, common address (u16 LE).

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Iec104Error, Result};
use crate::types::{Cot, ObjectValue, TypeId};

/// Variable Structure Qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vsq {
    /// Number of information objects (1..=127)
    pub count: u8,
    /// SQ: objects share one start IOA and pack their bodies
    pub sequence: bool,
}

impl Vsq {
    /// Build a VSQ.
    #[inline]
    pub const fn new(count: u8, sequence: bool) -> Self {
        Self { count, sequence }
    }

    /// Decode from the octet.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        Self {
            count: value & 0x7F,
            sequence: (value & 0x80) != 0,
        }
    }

    /// Encode to the octet.
    #[inline]
    pub const fn as_u8(&self) -> u8 {
        (self.count & 0x7F) | if self.sequence { 0x80 } else { 0 }
    }
}

/// Information Object Address, 24 bits on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ioa(pub u32);

impl Ioa {
    /// Construct, masking to 24 bits.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value & 0x00FF_FFFF)
    }

    /// Parse three little-endian octets.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 3 {
            return Err(Iec104Error::invalid_asdu_static("IOA too short"));
        }
        Ok(Self(
            bytes[0] as u32 | (bytes[1] as u32) << 8 | (bytes[2] as u32) << 16,
        ))
    }

    /// Encode to three little-endian octets.
    #[inline]
    pub const fn to_bytes(self) -> [u8; 3] {
        [
            (self.0 & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            ((self.0 >> 16) & 0xFF) as u8,
        ]
    }

    /// Raw address value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Ioa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed six-octet ASDU header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsduHeader {
    /// Type identification
    pub type_id: TypeId,
    /// Variable structure qualifier
    pub vsq: Vsq,
    /// Cause of transmission
    pub cot: Cot,
    /// P/N: negative confirmation
    pub negative: bool,
    /// T: test ASDU
    pub test: bool,
    /// Originator address
    pub originator: u8,
    /// Common address of ASDU
    pub common_address: u16,
}

impl AsduHeader {
    /// Header for a single-object ASDU (SQ=0, N=1).
    pub const fn single(type_id: TypeId, cot: Cot, originator: u8, common_address: u16) -> Self {
        Self {
            type_id,
            vsq: Vsq::new(1, false),
            cot,
            negative: false,
            test: false,
            originator,
            common_address,
        }
    }

    /// Parse from at least six octets; returns the octets consumed.
    pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < 6 {
            return Err(Iec104Error::invalid_asdu_static("ASDU header too short"));
        }
        let type_id = TypeId::from_u8(data[0])?;
        let vsq = Vsq::from_u8(data[1]);
        let cot = Cot::from_u8(data[2])?;
        Ok((
            Self {
                type_id,
                vsq,
                cot,
                negative: (data[2] & 0x40) != 0,
                test: (data[2] & 0x80) != 0,
                originator: data[3],
                common_address: u16::from_le_bytes([data[4], data[5]]),
            },
            6,
        ))
    }

    /// Encode into the buffer.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.type_id.as_u8());
        buf.put_u8(self.vsq.as_u8());
        buf.put_u8(
            self.cot.as_u8() | (self.negative as u8) << 6 | (self.test as u8) << 7,
        );
        buf.put_u8(self.originator);
        buf.put_u16_le(self.common_address);
    }
}

/// One information object: address plus decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct InformationObject {
    /// 24-bit object address
    pub ioa: Ioa,
    /// Decoded body
    pub value: ObjectValue,
}

impl InformationObject {
    /// Construct from a raw address and a body.
    pub fn new(ioa: u32, value: ObjectValue) -> Self {
        Self {
            ioa: Ioa::new(ioa),
            value,
        }
    }
}

/// Complete ASDU with decoded objects.
#[derive(Debug, Clone, PartialEq)]
pub struct Asdu {
    /// Fixed header
    pub header: AsduHeader,
    /// Information objects; for SQ=1 the addresses are consecutive
    pub objects: Vec<InformationObject>,
}

impl Asdu {
    /// Single-object ASDU, the shape every outgoing command takes.
    pub fn single(
        cot: Cot,
        originator: u8,
        common_address: u16,
        ioa: u32,
        value: ObjectValue,
    ) -> Self {
        Self {
            header: AsduHeader::single(value.type_id(), cot, originator, common_address),
            objects: vec![InformationObject::new(ioa, value)],
        }
    }

    /// Encoded size in octets.
    pub fn encoded_len(&self) -> usize {
        let body = ObjectValue::body_len(self.header.type_id);
        let per_object = if self.header.vsq.sequence {
            body
        } else {
            3 + body
        };
        6 + if self.header.vsq.sequence && !self.objects.is_empty() {
            3 + self.objects.len() * per_object
        } else {
            self.objects.len() * per_object
        }
    }

    /// Encode header and objects into a fresh buffer.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_to(&mut buf);
        buf.freeze()
    }

    /// Encode into the provided buffer.
    pub fn encode_to(&self, buf: &mut BytesMut) {
        self.header.encode(buf);
        for (i, obj) in self.objects.iter().enumerate() {
            if i == 0 || !self.header.vsq.sequence {
                buf.put_slice(&obj.ioa.to_bytes());
            }
            obj.value.encode_body(buf);
        }
    }
}
