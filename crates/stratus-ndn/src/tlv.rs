//! Minimal NDN TLV encoding.
//!
//! Just enough of the TLV wire format to frame names and Data packets for
//! signing and emission: variable-length numbers, element framing, and the
//! non-negative integer codec shared with marker-based name components.

/// Interest packet element.
pub const INTEREST: u64 = 0x05;
/// Data packet element.
pub const DATA: u64 = 0x06;
/// Name element.
pub const NAME: u64 = 0x07;
/// Generic name component element.
pub const COMPONENT: u64 = 0x08;
/// MetaInfo element.
pub const META_INFO: u64 = 0x14;
/// Content element.
pub const CONTENT: u64 = 0x15;
/// SignatureInfo element.
pub const SIGNATURE_INFO: u64 = 0x16;
/// SignatureValue element.
pub const SIGNATURE_VALUE: u64 = 0x17;
/// FreshnessPeriod element (milliseconds).
pub const FRESHNESS_PERIOD: u64 = 0x19;
/// FinalBlockId element.
pub const FINAL_BLOCK_ID: u64 = 0x1A;
/// SignatureType element.
pub const SIGNATURE_TYPE: u64 = 0x1B;
/// KeyLocator element.
pub const KEY_LOCATOR: u64 = 0x1C;

/// Append a TLV variable-length number.
pub fn write_var_number(value: u64, out: &mut Vec<u8>) {
    if value < 253 {
        out.push(value as u8);
    } else if value <= u64::from(u16::MAX) {
        out.push(253);
        out.extend_from_slice(&(value as u16).to_be_bytes());
    } else if value <= u64::from(u32::MAX) {
        out.push(254);
        out.extend_from_slice(&(value as u32).to_be_bytes());
    } else {
        out.push(255);
        out.extend_from_slice(&value.to_be_bytes());
    }
}

/// Append a full TLV element: type, length, payload.
pub fn write_element(element_type: u64, payload: &[u8], out: &mut Vec<u8>) {
    write_var_number(element_type, out);
    write_var_number(payload.len() as u64, out);
    out.extend_from_slice(payload);
}

/// Encode a non-negative integer in the shortest of the 1/2/4/8-byte
/// big-endian widths the NDN conventions allow.
pub fn non_negative(value: u64) -> Vec<u8> {
    if value <= u64::from(u8::MAX) {
        vec![value as u8]
    } else if value <= u64::from(u16::MAX) {
        (value as u16).to_be_bytes().to_vec()
    } else if value <= u64::from(u32::MAX) {
        (value as u32).to_be_bytes().to_vec()
    } else {
        value.to_be_bytes().to_vec()
    }
}

/// Decode a non-negative integer; the slice must be exactly one of the four
/// legal widths.
pub fn parse_non_negative(bytes: &[u8]) -> Option<u64> {
    match bytes.len() {
        1 => Some(u64::from(bytes[0])),
        2 => Some(u64::from(u16::from_be_bytes([bytes[0], bytes[1]]))),
        4 => {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(bytes);
            Some(u64::from(u32::from_be_bytes(raw)))
        }
        8 => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(bytes);
            Some(u64::from_be_bytes(raw))
        }
        _ => None,
    }
}

/// Convenience: a TLV element whose payload is a non-negative integer.
pub fn write_non_negative_element(element_type: u64, value: u64, out: &mut Vec<u8>) {
    write_element(element_type, &non_negative(value), out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_number_widths() {
        let mut out = Vec::new();
        write_var_number(42, &mut out);
        assert_eq!(out, vec![42]);

        out.clear();
        write_var_number(253, &mut out);
        assert_eq!(out, vec![253, 0x00, 0xFD]);

        out.clear();
        write_var_number(0x1_0000, &mut out);
        assert_eq!(out, vec![254, 0x00, 0x01, 0x00, 0x00]);

        out.clear();
        write_var_number(0x1_0000_0000, &mut out);
        assert_eq!(out[0], 255);
        assert_eq!(out.len(), 9);
    }

    #[test]
    fn test_element_framing() {
        let mut out = Vec::new();
        write_element(COMPONENT, b"abc", &mut out);
        assert_eq!(out, vec![0x08, 0x03, b'a', b'b', b'c']);
    }

    #[test]
    fn test_non_negative_roundtrip() {
        for value in [0u64, 0xFF, 0x100, 0xFFFF, 0x1_0000, u64::from(u32::MAX), 1_451_000_000_000_000] {
            let encoded = non_negative(value);
            assert!(matches!(encoded.len(), 1 | 2 | 4 | 8));
            assert_eq!(parse_non_negative(&encoded), Some(value));
        }
    }

    #[test]
    fn test_non_negative_rejects_odd_widths() {
        assert_eq!(parse_non_negative(&[0, 0, 0]), None);
        assert_eq!(parse_non_negative(&[]), None);
    }
}
