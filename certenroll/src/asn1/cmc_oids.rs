//! Object identifiers from RFC 5272 (CMC), RFC 4211 (CRMF) and RFC 2985 (PKCS #9) used when
//! processing enrollment requests.

use der::asn1::ObjectIdentifier;

// -------------------------------------------------------------------------------------------------
// Content types
// -------------------------------------------------------------------------------------------------

/// id-signedData OBJECT IDENTIFIER ::= { iso(1) member-body(2)
///     us(840) rsadsi(113549) pkcs(1) pkcs7(7) 2 }
pub const ID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");

/// id-cct-PKIData OBJECT IDENTIFIER ::= { id-pkix id-cct(12) 2 }
pub const ID_CCT_PKI_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.12.2");

/// id-cct-PKIResponse OBJECT IDENTIFIER ::= { id-pkix id-cct(12) 3 }
pub const ID_CCT_PKI_RESPONSE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.12.3");

// -------------------------------------------------------------------------------------------------
// CMC controls, i.e., id-cmc OBJECT IDENTIFIER ::= { id-pkix 7 }
// -------------------------------------------------------------------------------------------------

/// id-cmc-statusInfo OBJECT IDENTIFIER ::= { id-cmc 1 }
pub const ID_CMC_STATUS_INFO: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.1");
/// id-cmc-identification OBJECT IDENTIFIER ::= { id-cmc 2 }
pub const ID_CMC_IDENTIFICATION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.2");
/// id-cmc-identityProof OBJECT IDENTIFIER ::= { id-cmc 3 }
pub const ID_CMC_IDENTITY_PROOF: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.3");
/// id-cmc-dataReturn OBJECT IDENTIFIER ::= { id-cmc 4 }
pub const ID_CMC_DATA_RETURN: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.4");
/// id-cmc-transactionId OBJECT IDENTIFIER ::= { id-cmc 5 }
pub const ID_CMC_TRANSACTION_ID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.5");
/// id-cmc-senderNonce OBJECT IDENTIFIER ::= { id-cmc 6 }
pub const ID_CMC_SENDER_NONCE: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.6");
/// id-cmc-recipientNonce OBJECT IDENTIFIER ::= { id-cmc 7 }
pub const ID_CMC_RECIPIENT_NONCE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.7");
/// id-cmc-addExtensions OBJECT IDENTIFIER ::= { id-cmc 8 }
pub const ID_CMC_ADD_EXTENSIONS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.8");
/// id-cmc-encryptedPOP OBJECT IDENTIFIER ::= { id-cmc 9 }
pub const ID_CMC_ENCRYPTED_POP: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.9");
/// id-cmc-decryptedPOP OBJECT IDENTIFIER ::= { id-cmc 10 }
pub const ID_CMC_DECRYPTED_POP: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.10");
/// id-cmc-lraPOPWitness OBJECT IDENTIFIER ::= { id-cmc 11 }
pub const ID_CMC_LRA_POP_WITNESS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.11");
/// id-cmc-getCert OBJECT IDENTIFIER ::= { id-cmc 15 }
pub const ID_CMC_GET_CERT: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.15");
/// id-cmc-getCRL OBJECT IDENTIFIER ::= { id-cmc 16 }
pub const ID_CMC_GET_CRL: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.16");
/// id-cmc-revokeRequest OBJECT IDENTIFIER ::= { id-cmc 17 }
pub const ID_CMC_REVOKE_REQUEST: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.17");
/// id-cmc-regInfo OBJECT IDENTIFIER ::= { id-cmc 18 }
pub const ID_CMC_REG_INFO: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.18");
/// id-cmc-responseInfo OBJECT IDENTIFIER ::= { id-cmc 19 }
pub const ID_CMC_RESPONSE_INFO: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.19");
/// id-cmc-queryPending OBJECT IDENTIFIER ::= { id-cmc 21 }
pub const ID_CMC_QUERY_PENDING: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.21");
/// id-cmc-popLinkRandom OBJECT IDENTIFIER ::= { id-cmc 22 }
pub const ID_CMC_POP_LINK_RANDOM: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.22");
/// id-cmc-popLinkWitness OBJECT IDENTIFIER ::= { id-cmc 23 }
pub const ID_CMC_POP_LINK_WITNESS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.23");
/// id-cmc-confirmCertAcceptance OBJECT IDENTIFIER ::= { id-cmc 24 }
pub const ID_CMC_CONFIRM_CERT_ACCEPTANCE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.24");
/// id-cmc-statusInfoV2 OBJECT IDENTIFIER ::= { id-cmc 25 }
pub const ID_CMC_STATUS_INFO_V2: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.25");
/// id-cmc-trustedAnchors OBJECT IDENTIFIER ::= { id-cmc 26 }
pub const ID_CMC_TRUSTED_ANCHORS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.26");
/// id-cmc-authData OBJECT IDENTIFIER ::= { id-cmc 27 }
pub const ID_CMC_AUTH_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.27");
/// id-cmc-batchRequests OBJECT IDENTIFIER ::= { id-cmc 28 }
pub const ID_CMC_BATCH_REQUESTS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.28");
/// id-cmc-batchResponses OBJECT IDENTIFIER ::= { id-cmc 29 }
pub const ID_CMC_BATCH_RESPONSES: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.29");
/// id-cmc-publishCert OBJECT IDENTIFIER ::= { id-cmc 30 }
pub const ID_CMC_PUBLISH_CERT: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.30");
/// id-cmc-modCertTemplate OBJECT IDENTIFIER ::= { id-cmc 31 }
pub const ID_CMC_MOD_CERT_TEMPLATE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.31");
/// id-cmc-controlProcessed OBJECT IDENTIFIER ::= { id-cmc 32 }
pub const ID_CMC_CONTROL_PROCESSED: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.32");
/// id-cmc-popLinkWitnessV2 OBJECT IDENTIFIER ::= { id-cmc 33 }
pub const ID_CMC_POP_LINK_WITNESS_V2: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.33");
/// id-cmc-identityProofV2 OBJECT IDENTIFIER ::= { id-cmc 34 }
pub const ID_CMC_IDENTITY_PROOF_V2: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.34");

// -------------------------------------------------------------------------------------------------
// CRMF registration controls and registration info
// -------------------------------------------------------------------------------------------------

/// id-regCtrl-regToken OBJECT IDENTIFIER ::= { id-regCtrl 1 }
pub const ID_REG_CTRL_REG_TOKEN: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.5.1.1");
/// id-regCtrl-authenticator OBJECT IDENTIFIER ::= { id-regCtrl 2 }
pub const ID_REG_CTRL_AUTHENTICATOR: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.5.1.2");
/// id-regCtrl-pkiPublicationInfo OBJECT IDENTIFIER ::= { id-regCtrl 3 }
pub const ID_REG_CTRL_PKI_PUBLICATION_INFO: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.5.1.3");
/// id-regCtrl-pkiArchiveOptions OBJECT IDENTIFIER ::= { id-regCtrl 4 }
pub const ID_REG_CTRL_PKI_ARCHIVE_OPTIONS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.5.1.4");
/// id-regCtrl-oldCertID OBJECT IDENTIFIER ::= { id-regCtrl 5 }
pub const ID_REG_CTRL_OLD_CERT_ID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.5.1.5");
/// id-regCtrl-protocolEncrKey OBJECT IDENTIFIER ::= { id-regCtrl 6 }
pub const ID_REG_CTRL_PROTOCOL_ENCR_KEY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.5.1.6");
/// id-regInfo-utf8Pairs OBJECT IDENTIFIER ::= { id-regInfo 1 }
pub const ID_REG_INFO_UTF8_PAIRS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.5.2.1");

// -------------------------------------------------------------------------------------------------
// PKCS #9
// -------------------------------------------------------------------------------------------------

/// pkcs-9-at-extensionRequest OBJECT IDENTIFIER ::= { pkcs-9 14 }
pub const PKCS9_EXTENSION_REQUEST: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.14");

static CMC_OID_NAMES: &[(ObjectIdentifier, &str)] = &[
    (ID_CMC_STATUS_INFO, "statusInfo"),
    (ID_CMC_IDENTIFICATION, "identification"),
    (ID_CMC_IDENTITY_PROOF, "identityProof"),
    (ID_CMC_DATA_RETURN, "dataReturn"),
    (ID_CMC_TRANSACTION_ID, "transactionId"),
    (ID_CMC_SENDER_NONCE, "senderNonce"),
    (ID_CMC_RECIPIENT_NONCE, "recipientNonce"),
    (ID_CMC_ADD_EXTENSIONS, "addExtensions"),
    (ID_CMC_ENCRYPTED_POP, "encryptedPOP"),
    (ID_CMC_DECRYPTED_POP, "decryptedPOP"),
    (ID_CMC_LRA_POP_WITNESS, "lraPOPWitness"),
    (ID_CMC_GET_CERT, "getCert"),
    (ID_CMC_GET_CRL, "getCRL"),
    (ID_CMC_REVOKE_REQUEST, "revokeRequest"),
    (ID_CMC_REG_INFO, "regInfo"),
    (ID_CMC_RESPONSE_INFO, "responseInfo"),
    (ID_CMC_QUERY_PENDING, "queryPending"),
    (ID_CMC_POP_LINK_RANDOM, "popLinkRandom"),
    (ID_CMC_POP_LINK_WITNESS, "popLinkWitness"),
    (ID_CMC_CONFIRM_CERT_ACCEPTANCE, "confirmCertAcceptance"),
    (ID_CMC_STATUS_INFO_V2, "statusInfoV2"),
    (ID_CMC_TRUSTED_ANCHORS, "trustedAnchors"),
    (ID_CMC_AUTH_DATA, "authData"),
    (ID_CMC_BATCH_REQUESTS, "batchRequests"),
    (ID_CMC_BATCH_RESPONSES, "batchResponses"),
    (ID_CMC_PUBLISH_CERT, "publishCert"),
    (ID_CMC_MOD_CERT_TEMPLATE, "modCertTemplate"),
    (ID_CMC_CONTROL_PROCESSED, "controlProcessed"),
    (ID_CMC_POP_LINK_WITNESS_V2, "popLinkWitnessV2"),
    (ID_CMC_IDENTITY_PROOF_V2, "identityProofV2"),
    (ID_REG_CTRL_REG_TOKEN, "regToken"),
    (ID_REG_CTRL_AUTHENTICATOR, "authenticator"),
    (ID_REG_CTRL_PKI_PUBLICATION_INFO, "pkiPublicationInfo"),
    (ID_REG_CTRL_PKI_ARCHIVE_OPTIONS, "pkiArchiveOptions"),
    (ID_REG_CTRL_OLD_CERT_ID, "oldCertID"),
    (ID_REG_CTRL_PROTOCOL_ENCR_KEY, "protocolEncrKey"),
    (ID_REG_INFO_UTF8_PAIRS, "utf8Pairs"),
    (PKCS9_EXTENSION_REQUEST, "extensionRequest"),
];

/// Returns a short human readable name for CMC and CRMF object identifiers, suitable for log
/// output. Unrecognized values are returned in dotted form.
pub fn cmc_oid_lookup(oid: &ObjectIdentifier) -> String {
    match CMC_OID_NAMES.iter().find(|(o, _)| o == oid) {
        Some((_, name)) => name.to_string(),
        None => oid.to_string(),
    }
}

#[test]
fn cmc_oid_lookup_test() {
    assert_eq!("identityProofV2", cmc_oid_lookup(&ID_CMC_IDENTITY_PROOF_V2));
    assert_eq!("lraPOPWitness", cmc_oid_lookup(&ID_CMC_LRA_POP_WITNESS));
    assert_eq!(
        "1.2.3.4",
        cmc_oid_lookup(&ObjectIdentifier::new_unwrap("1.2.3.4"))
    );
}
