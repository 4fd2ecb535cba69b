//! Utility functions supporting certificate enrollment

use der::asn1::{Ia5String, ObjectIdentifier, PrintableString, Utf8StringRef};
use der::{Decode, Encode, Header, Reader, SliceReader, Tagged};
use log::error;
use spki::AlgorithmIdentifierOwned;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::Name;

use crate::util::enroll_alg_oids::*;
use crate::util::error::*;

/// id-at-commonName from RFC 4519
pub const PKIX_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// userid from RFC 4519
pub const PKIX_UID: ObjectIdentifier = ObjectIdentifier::new_unwrap("0.9.2342.19200300.100.1.1");

/// get_hash_alg_from_sig_alg takes an ObjectIdentifier that notionally contains a signature
/// algorithm, i.e., [`PKIXALG_SHA256_WITH_RSA_ENCRYPTION`] and returns an AlgorithmIdentifier
/// containing the associated hash algorithm, i.e., [`PKIXALG_SHA256`].
pub fn get_hash_alg_from_sig_alg(sig_alg: &ObjectIdentifier) -> Result<AlgorithmIdentifierOwned> {
    let oid = if PKIXALG_SHA256_WITH_RSA_ENCRYPTION == *sig_alg
        || PKIXALG_ECDSA_WITH_SHA256 == *sig_alg
    {
        PKIXALG_SHA256
    } else if PKIXALG_SHA384_WITH_RSA_ENCRYPTION == *sig_alg {
        PKIXALG_SHA384
    } else if PKIXALG_SHA224_WITH_RSA_ENCRYPTION == *sig_alg {
        PKIXALG_SHA224
    } else if PKIXALG_SHA512_WITH_RSA_ENCRYPTION == *sig_alg {
        PKIXALG_SHA512
    } else if PKIXALG_SHA1_WITH_RSA_ENCRYPTION == *sig_alg {
        PKIXALG_SHA1
    } else {
        return Err(Error::Unrecognized);
    };
    Ok(AlgorithmIdentifierOwned {
        oid,
        parameters: None,
    })
}

/// get_nested_tlvs takes a buffer containing a single DER-encoded constructed value and returns
/// slices containing each of the encoded values nested within it, exactly as they appear in the
/// buffer. The tag of the outer value is not checked, so the function serves for SEQUENCE, SET
/// and implicitly tagged constructed values alike.
pub fn get_nested_tlvs(buffer: &[u8]) -> Result<Vec<&[u8]>> {
    let mut reader = SliceReader::new(buffer)?;
    let header = Header::decode(&mut reader)?;
    if !header.tag.is_constructed() {
        return Err(Error::BadRequest(
            "expected a constructed value".to_string(),
        ));
    }
    let children = reader.read_nested(header.length, |reader| {
        let mut children = vec![];
        while !reader.is_finished() {
            children.push(reader.tlv_bytes()?);
        }
        Ok(children)
    })?;
    Ok(reader.finish(children)?)
}

/// get_value_from_rdn returns the value from AttributeTypeAndValue as a string. Values that are not
/// a PrintableString, UTF8String or IA5String yield None.
pub fn get_value_from_rdn(atav: &AttributeTypeAndValue) -> Option<String> {
    match atav.value.tag() {
        der::Tag::PrintableString => atav
            .value
            .decode_as()
            .ok()
            .map(|s: PrintableString| s.to_string()),
        der::Tag::Utf8String => atav
            .value
            .decode_as()
            .ok()
            .map(|s: Utf8StringRef<'_>| s.to_string()),
        der::Tag::Ia5String => atav
            .value
            .decode_as()
            .ok()
            .map(|s: Ia5String| s.to_string()),
        _ => None,
    }
}

/// get_attribute_from_name returns the value of the last instance of the given attribute type in a
/// name, i.e., the most specific common name. An empty string is returned when the attribute is
/// absent or cannot be read as a string.
pub fn get_attribute_from_name(name: &Name, attr_type: &ObjectIdentifier) -> String {
    let mut retval = String::new();
    for rdn in name.0.iter() {
        for atav in rdn.0.iter() {
            if atav.oid == *attr_type {
                match get_value_from_rdn(atav) {
                    Some(v) => retval = v,
                    None => error!(
                        "Ignoring {} attribute that could not be read as a string",
                        attr_type
                    ),
                }
            }
        }
    }
    retval
}

/// get_subject_cn returns the common name from a name or an empty string.
pub fn get_subject_cn(name: &Name) -> String {
    get_attribute_from_name(name, &PKIX_COMMON_NAME)
}

/// get_subject_uid returns the user ID from a name or an empty string.
pub fn get_subject_uid(name: &Name) -> String {
    get_attribute_from_name(name, &PKIX_UID)
}

/// name_to_string returns a string representation of given Name value.
pub fn name_to_string(name: &Name) -> String {
    name.to_string()
}

/// buffer_to_hex takes a byte array and returns a string featuring upper case ASCII hex characters
/// (without commas, spaces, brackets, etc.).
pub fn buffer_to_hex(buffer: &[u8]) -> String {
    buffer.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Encodes the given value and returns the DER bytes, mapping failures to an internal error.
pub(crate) fn encode_value<T: Encode>(value: &T, what: &str) -> Result<Vec<u8>> {
    value
        .to_der()
        .map_err(|e| Error::InternalError(format!("failed to encode {}: {}", what, e)))
}

/// Decodes a value from a DER buffer, mapping failures to a BadRequest error naming the structure.
pub(crate) fn decode_value<'a, T: Decode<'a>>(buffer: &'a [u8], what: &str) -> Result<T> {
    T::from_der(buffer).map_err(|e| Error::BadRequest(format!("malformed {}: {}", what, e)))
}
