//! ASDU payload parser.
//!
//! One address loop serves every type identification: SQ=0 reads a
//! 3-octet IOA in front of each body, SQ=1 reads the group IOA once and
//! expands consecutive addresses. The body layout itself is the job of
//! [`ObjectValue::decode_body`].

use crate::error::{Iec104Error, Result};
use crate::types::{Asdu, AsduHeader, InformationObject, Ioa, ObjectValue};

/// Parse a complete ASDU (header plus objects) from an I-frame payload.
pub fn parse_asdu(data: &[u8]) -> Result<Asdu> {
    let (header, used) = AsduHeader::parse(data)?;
    let objects = decode_objects(&header, &data[used..])?;
    Ok(Asdu { header, objects })
}

/// Decode the information objects that follow an already-parsed header.
pub fn decode_objects(header: &AsduHeader, payload: &[u8]) -> Result<Vec<InformationObject>> {
    let count = header.vsq.count as usize;
    let body_len = ObjectValue::body_len(header.type_id);

    let mut objects = Vec::with_capacity(count);
    let mut offset = 0usize;
    let mut address = 0u32;

    for i in 0..count {
        if i == 0 || !header.vsq.sequence {
            if payload.len() < offset + 3 {
                return Err(Iec104Error::invalid_asdu_static("payload truncated at IOA"));
            }
            address = Ioa::from_bytes(&payload[offset..offset + 3])?.value();
            offset += 3;
        } else {
            address = address.wrapping_add(1) & 0x00FF_FFFF;
        }

        if payload.len() < offset + body_len {
            return Err(Iec104Error::invalid_asdu(format!(
                "payload truncated in object {} of {count}",
                i + 1
            )));
        }
        let value = ObjectValue::decode_body(header.type_id, &payload[offset..offset + body_len])?;
        offset += body_len;

        objects.push(InformationObject::new(address, value));
    }

    Ok(objects)
}
