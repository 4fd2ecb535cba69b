//! The payload module normalizes the encodings in which requests arrive, i.e., binary DER, PEM or
//! bare base64, to DER.

use base64ct::{Base64, Encoding};

use crate::util::error::*;

/// DER encoding of a SEQUENCE tag, the first byte of every supported request.
const DER_SEQUENCE: u8 = 0x30;

/// normalize_payload returns the DER encoding of a payload presented as DER, PEM (any label) or
/// base64 with embedded whitespace.
pub fn normalize_payload(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.is_empty() {
        return Err(Error::BadRequest("empty request".to_string()));
    }
    if payload[0] == DER_SEQUENCE {
        return Ok(payload.to_vec());
    }

    let text = core::str::from_utf8(payload)
        .map_err(|_| Error::BadRequest("request is neither DER nor text".to_string()))?
        .trim();
    if text.starts_with("-----BEGIN") {
        return match pem_rfc7468::decode_vec(text.as_bytes()) {
            Ok((_label, der)) => Ok(der),
            Err(e) => Err(Error::BadRequest(format!("malformed PEM request: {}", e))),
        };
    }

    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(Error::BadRequest("empty request".to_string()));
    }
    Base64::decode_vec(&compact)
        .map_err(|e| Error::BadRequest(format!("malformed base64 request: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_payload_test() {
        let der = vec![0x30, 0x03, 0x02, 0x01, 0x05];
        assert_eq!(der, normalize_payload(&der).unwrap());

        let b64 = Base64::encode_string(&der);
        assert_eq!(der, normalize_payload(b64.as_bytes()).unwrap());

        let wrapped = format!("  {}\r\n{}\n", &b64[..4], &b64[4..]);
        assert_eq!(der, normalize_payload(wrapped.as_bytes()).unwrap());

        let pem = pem_rfc7468::encode_string(
            "NEW CERTIFICATE REQUEST",
            pem_rfc7468::LineEnding::LF,
            &der,
        )
        .unwrap();
        assert_eq!(der, normalize_payload(pem.as_bytes()).unwrap());

        assert!(matches!(normalize_payload(b""), Err(Error::BadRequest(_))));
        assert!(matches!(normalize_payload(b"   "), Err(Error::BadRequest(_))));
        assert!(matches!(
            normalize_payload(b"not base64!"),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            normalize_payload(&[0xff, 0xfe, 0x00]),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            normalize_payload(b"-----BEGIN CMC-----\nAAA\n"),
            Err(Error::BadRequest(_))
        ));
    }
}
