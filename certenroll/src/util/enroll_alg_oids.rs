//! Provides definitions of algorithm OIDs from PKIXAlgs-2009, RFC 8018, RFC 4231 and RFC 5084
//! used for witness computation, signature verification and challenge encryption.

use der::asn1::ObjectIdentifier;

// -------------------------------------------------------------------------------------------------
// Public key algorithms
// -------------------------------------------------------------------------------------------------

/// rsaEncryption OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) rsadsi(113549) pkcs(1)
///     pkcs-1(1) 1 }
pub const PKIXALG_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// id-ecPublicKey OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) ansi-X9-62(10045) keyType(2) 1 }
pub const PKIXALG_EC_PUBLIC_KEY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

///    secp256r1 OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) ansi-X9-62(10045) curves(3)
///     prime(1) 7 }
pub const PKIXALG_SECP256R1: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");

// -------------------------------------------------------------------------------------------------
// Signature algorithms
// -------------------------------------------------------------------------------------------------

/// sha1WithRSAEncryption OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) rsadsi(113549) pkcs(1)
///     pkcs-1(1) 5  }
pub const PKIXALG_SHA1_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");

/// sha224WithRSAEncryption OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) rsadsi(113549) pkcs(1)
///     pkcs-1(1) 14 }
pub const PKIXALG_SHA224_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.14");

/// sha256WithRSAEncryption OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) rsadsi(113549) pkcs(1)
///     pkcs-1(1) 11 }
pub const PKIXALG_SHA256_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");

/// sha384WithRSAEncryption OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) rsadsi(113549) pkcs(1)
///     pkcs-1(1) 12 }
pub const PKIXALG_SHA384_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");

/// sha512WithRSAEncryption OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) rsadsi(113549) pkcs(1)
///     pkcs-1(1) 13 }
pub const PKIXALG_SHA512_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");

/// ecdsa-with-SHA256 OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) ansi-X9-62(10045) signatures(4)
///     ecdsa-with-SHA2(3) 2 }
pub const PKIXALG_ECDSA_WITH_SHA256: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");

// -------------------------------------------------------------------------------------------------
// Hash algorithms
// -------------------------------------------------------------------------------------------------

/// id-sha1 OBJECT IDENTIFIER ::= {
///     iso(1) identified-organization(3) oiw(14) secsig(3)
///     algorithms(2) 26 }
pub const PKIXALG_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");

/// id-sha224 OBJECT IDENTIFIER ::= {
///     joint-iso-itu-t(2) country(16) us(840) organization(1) gov(101)
///     csor(3) nistalgorithm(4) hashalgs(2) 4 }
pub const PKIXALG_SHA224: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.4");

/// id-sha256 OBJECT IDENTIFIER ::= {
///     joint-iso-itu-t(2) country(16) us(840) organization(1) gov(101)
///     csor(3) nistalgorithm(4) hashalgs(2) 1 }
pub const PKIXALG_SHA256: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");

/// id-sha384 OBJECT IDENTIFIER ::= {
///     joint-iso-itu-t(2) country(16) us(840) organization(1) gov(101)
///     csor(3) nistalgorithm(4) hashalgs(2) 2 }
pub const PKIXALG_SHA384: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.2");

/// id-sha512 OBJECT IDENTIFIER ::= {
///     joint-iso-itu-t(2) country(16) us(840) organization(1) gov(101)
///     csor(3) nistalgorithm(4) hashalgs(2) 3 }
pub const PKIXALG_SHA512: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.3");

// -------------------------------------------------------------------------------------------------
// Keyed hash algorithms
// -------------------------------------------------------------------------------------------------

/// hMAC-SHA1 OBJECT IDENTIFIER ::= {
///     iso(1) identified-organization(3) dod(6) internet(1) security(5)
///     mechanisms(5) 8 1 2 }
///
/// This is the form named by RFC 5272 for identity proof and POP link witnesses.
pub const PKIXALG_HMAC_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.8.1.2");

/// id-hmacWithSHA1 OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) rsadsi(113549) digestAlgorithm(2) 7 }
pub const PKIXALG_HMAC_WITH_SHA1: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.2.7");

/// id-hmacWithSHA224 OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) rsadsi(113549) digestAlgorithm(2) 8 }
pub const PKIXALG_HMAC_WITH_SHA224: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.2.8");

/// id-hmacWithSHA256 OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) rsadsi(113549) digestAlgorithm(2) 9 }
pub const PKIXALG_HMAC_WITH_SHA256: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.2.9");

/// id-hmacWithSHA384 OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) rsadsi(113549) digestAlgorithm(2) 10 }
pub const PKIXALG_HMAC_WITH_SHA384: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.2.10");

/// id-hmacWithSHA512 OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) rsadsi(113549) digestAlgorithm(2) 11 }
pub const PKIXALG_HMAC_WITH_SHA512: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.2.11");

// -------------------------------------------------------------------------------------------------
// Symmetric encryption
// -------------------------------------------------------------------------------------------------

/// id-aes256-GCM OBJECT IDENTIFIER ::= { aes 46 }
pub const PKIXALG_AES256_GCM: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.1.46");
