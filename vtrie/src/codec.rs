//! # RLP helpers
//!
//! Byte-string and list decoding on top of `alloy_rlp::Header`, plus exact
//! decoding that rejects trailing bytes.

use alloy_rlp::{Decodable, Encodable, Header};

use crate::error::{decode_failed, Error, Result};

/// Decode an RLP byte string, advancing `buf`
pub fn decode_bytes<'a>(buf: &mut &'a [u8]) -> alloy_rlp::Result<&'a [u8]> {
    let header = Header::decode(buf)?;
    if header.list {
        return Err(alloy_rlp::Error::UnexpectedList);
    }
    take_payload(buf, header.payload_length)
}

/// Decode an RLP list header and return its payload, advancing `buf` past it
pub fn decode_list_payload<'a>(buf: &mut &'a [u8]) -> alloy_rlp::Result<&'a [u8]> {
    let header = Header::decode(buf)?;
    if !header.list {
        return Err(alloy_rlp::Error::UnexpectedString);
    }
    take_payload(buf, header.payload_length)
}

fn take_payload<'a>(buf: &mut &'a [u8], len: usize) -> alloy_rlp::Result<&'a [u8]> {
    let data: &'a [u8] = *buf;
    if data.len() < len {
        return Err(alloy_rlp::Error::InputTooShort);
    }
    let (payload, rest) = data.split_at(len);
    *buf = rest;
    Ok(payload)
}

/// Encoded length of a list whose items take `payload_length` bytes
pub fn list_length(payload_length: usize) -> usize {
    Header {
        list: true,
        payload_length,
    }
    .length()
        + payload_length
}

/// Encode any RLP item into a fresh buffer
pub fn to_bytes<T: Encodable + ?Sized>(item: &T) -> Vec<u8> {
    let mut out = Vec::with_capacity(item.length());
    item.encode(&mut out);
    out
}

/// Decode `bytes` as exactly one `T`; leftover bytes are Malformed
pub fn decode_exact<T: Decodable>(what: &'static str, bytes: &[u8]) -> Result<T> {
    let mut buf = bytes;
    let ret = T::decode(&mut buf).map_err(|e| decode_failed(what, e))?;
    if !buf.is_empty() {
        return Err(Error::trailing_bytes(buf.len()).with_context("item", what));
    }
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_decode_bytes() {
        let encoded = to_bytes(&b"hello"[..]);
        let mut buf = encoded.as_slice();
        assert_eq!(decode_bytes(&mut buf).unwrap(), b"hello");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_single_byte_string() {
        let encoded = to_bytes(&[0x05u8][..]);
        assert_eq!(encoded, vec![0x05]);
        let mut buf = encoded.as_slice();
        assert_eq!(decode_bytes(&mut buf).unwrap(), &[0x05]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_bytes_rejects_list() {
        let mut buf: &[u8] = &[0xc0];
        assert!(decode_bytes(&mut buf).is_err());
    }

    #[test]
    fn test_truncated_payload() {
        let mut buf: &[u8] = &[0x83, b'a'];
        assert_eq!(decode_bytes(&mut buf), Err(alloy_rlp::Error::InputTooShort));
    }

    #[test]
    fn test_decode_exact_rejects_trailing() {
        let mut encoded = to_bytes(&7u8);
        encoded.push(0x00);
        let err = decode_exact::<u8>("byte", &encoded).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_list_length() {
        assert_eq!(list_length(0), 1);
        assert_eq!(list_length(55), 56);
        assert_eq!(list_length(56), 58);
    }
}
