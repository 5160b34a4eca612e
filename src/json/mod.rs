//! JSON engine
//!
//! `stringify` and `parse` work directly on the runtime's object model, so
//! they observe getters, `toJSON` methods and replacer/reviver callbacks
//! exactly the way script code would.

mod parse;
mod stringify;

pub use parse::parse;
pub use stringify::stringify;

/// Append `units` to `out` as a quoted JSON string
pub(crate) fn quote_into(out: &mut Vec<u16>, units: &[u16]) {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    out.push(u16::from(b'"'));
    for &u in units {
        let escaped = match u {
            0x22 => Some(b'"'),
            0x5C => Some(b'\\'),
            0x2F => Some(b'/'),
            0x08 => Some(b'b'),
            0x0C => Some(b'f'),
            0x0A => Some(b'n'),
            0x0D => Some(b'r'),
            0x09 => Some(b't'),
            _ => None,
        };
        match escaped {
            Some(c) => {
                out.push(u16::from(b'\\'));
                out.push(u16::from(c));
            }
            None if u < 0x20 => {
                out.extend("\\u00".encode_utf16());
                out.push(u16::from(HEX[usize::from(u >> 4)]));
                out.push(u16::from(HEX[usize::from(u & 0xF)]));
            }
            None => out.push(u),
        }
    }
    out.push(u16::from(b'"'));
}
