//! The wire_decoder module decodes a normalized submission into [`SubRequest`] values and, for
//! CMC, a [`CmcEnvelope`] describing the PKIData that carried them.
//!
//! The encoded bytes that witnesses and signatures are computed over are retained exactly as
//! received alongside the decoded structures, since re-encoding a decoded structure is not
//! guaranteed to reproduce the input.

use cms::content_info::ContentInfo;
use cms::signed_data::SignedData;
use der::asn1::OctetString;
use der::Decode;
use spki::SubjectPublicKeyInfoOwned;
use x509_cert::ext::{Extension, Extensions};
use x509_cert::name::Name;
use x509_cert::request::CertReq;

use crate::asn1::*;
use crate::decoder::controls::*;
use crate::decoder::payload::normalize_payload;
use crate::request::RequestKind;
use crate::util::enroll_utilities::*;
use crate::util::error::*;
use crate::util::logging::*;

/// Decoded form of an individual request along with the encoding its signature covers
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RequestPayload {
    /// PKCS #10 request
    Pkcs10 {
        /// Decoded request
        request: CertReq,
        /// CertificationRequestInfo as received
        info: Vec<u8>,
    },
    /// CRMF request
    Crmf {
        /// Decoded request
        message: CertReqMsg,
        /// CertRequest as received
        cert_request: Vec<u8>,
    },
}

/// An individual request decoded from a submission
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubRequest {
    /// 0-based position of the request within its submission
    pub seq_num: u32,
    /// CMC body part ID or CRMF certReqId. PKCS #10 requests submitted directly use 0.
    pub body_part_id: BodyPartId,
    /// Request as received, i.e., the TaggedRequest for CMC, the CertReqMsg for CRMF and the
    /// CertificationRequest for PKCS #10
    pub encoded: Vec<u8>,
    /// Decoded request
    pub payload: RequestPayload,
}

impl SubRequest {
    /// Returns the request kind of the individual request
    pub fn kind(&self) -> RequestKind {
        match self.payload {
            RequestPayload::Pkcs10 { .. } => RequestKind::Pkcs10,
            RequestPayload::Crmf { .. } => RequestKind::Crmf,
        }
    }

    /// Returns the public key to be certified. CRMF templates may omit it.
    pub fn public_key(&self) -> Option<&SubjectPublicKeyInfoOwned> {
        match &self.payload {
            RequestPayload::Pkcs10 { request, .. } => Some(&request.info.public_key),
            RequestPayload::Crmf { message, .. } => {
                message.cert_req.cert_template.public_key.as_ref()
            }
        }
    }

    /// Returns the requested subject name. CRMF templates may omit it.
    pub fn subject(&self) -> Option<&Name> {
        match &self.payload {
            RequestPayload::Pkcs10 { request, .. } => Some(&request.info.subject),
            RequestPayload::Crmf { message, .. } => message.cert_req.cert_template.subject.as_ref(),
        }
    }

    /// Returns the POP link witness carried in the PKCS #10 attributes or CRMF controls, if any.
    pub fn pop_link_witness(&self) -> Result<Option<PopLinkWitness>> {
        match &self.payload {
            RequestPayload::Pkcs10 { request, .. } => {
                for attr in request.info.attributes.iter() {
                    for value in attr.values.iter() {
                        if let Some(w) = parse_pop_link_witness(&attr.oid, value)? {
                            return Ok(Some(w));
                        }
                    }
                }
            }
            RequestPayload::Crmf { message, .. } => {
                if let Some(controls) = &message.cert_req.controls {
                    for atv in controls {
                        if let Some(w) = parse_pop_link_witness(&atv.oid, &atv.value)? {
                            return Ok(Some(w));
                        }
                    }
                }
            }
        }
        Ok(None)
    }

    /// Returns the encoded PKIArchiveOptions control of a CRMF request, if any.
    pub fn archive_options(&self) -> Result<Option<Vec<u8>>> {
        if let RequestPayload::Crmf { message, .. } = &self.payload {
            if let Some(controls) = &message.cert_req.controls {
                for atv in controls {
                    if atv.oid == ID_REG_CTRL_PKI_ARCHIVE_OPTIONS {
                        return Ok(Some(encode_value(&atv.value, "PKIArchiveOptions")?));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Returns the requested extensions, i.e., the extensionRequest attribute of a PKCS #10
    /// request or the template extensions of a CRMF request.
    pub fn requested_extensions(&self) -> Result<Vec<Extension>> {
        match &self.payload {
            RequestPayload::Pkcs10 { request, .. } => {
                let mut exts = vec![];
                for attr in request.info.attributes.iter() {
                    if attr.oid != PKCS9_EXTENSION_REQUEST {
                        continue;
                    }
                    for value in attr.values.iter() {
                        let requested = value.decode_as::<Extensions>().map_err(|e| {
                            Error::BadRequest(format!("malformed extensionRequest: {}", e))
                        })?;
                        exts.extend(requested);
                    }
                }
                Ok(exts)
            }
            RequestPayload::Crmf { message, .. } => Ok(message
                .cert_req
                .cert_template
                .extensions
                .clone()
                .unwrap_or_default()),
        }
    }
}

/// Contents of a CMC PKIData aside from the requests themselves
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CmcEnvelope {
    /// True when the PKIData was carried in SignedData with at least one signer
    pub pre_signed: bool,
    /// PKIData as received
    pub pki_data: Vec<u8>,
    /// reqSequence as received
    pub req_sequence: Vec<u8>,
    /// Controls in the order received, one per attribute value
    pub controls: Vec<Control>,
    /// cmsSequence entries
    pub cms_sequence: Vec<TaggedContentInfo>,
    /// otherMsgSequence entries
    pub other_msgs: Vec<OtherMsg>,
    /// Body part IDs of the controls, requests, content infos and other messages in order
    pub body_part_ids: Vec<BodyPartId>,
}

impl CmcEnvelope {
    /// Returns the first identification control value, if any
    pub fn identification(&self) -> Option<&str> {
        self.controls.iter().find_map(|c| match &c.kind {
            ControlKind::Identification(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Returns the first popLinkRandom control value, if any
    pub fn pop_link_random(&self) -> Option<&[u8]> {
        self.controls.iter().find_map(|c| match &c.kind {
            ControlKind::PopLinkRandom(r) => Some(r.as_slice()),
            _ => None,
        })
    }

    /// Returns true if a revokeRequest control is present
    pub fn has_revoke_request(&self) -> bool {
        self.controls
            .iter()
            .any(|c| matches!(c.kind, ControlKind::RevokeRequest { .. }))
    }

    /// Returns true if an identityProof or identityProofV2 control is present
    pub fn has_identity_proof(&self) -> bool {
        self.controls.iter().any(|c| {
            matches!(
                c.kind,
                ControlKind::IdentityProof(_) | ControlKind::IdentityProofV2(_)
            )
        })
    }
}

/// Result of decoding a submission
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedSubmission {
    /// Kind of the submission, determined from the content when none was given
    pub kind: RequestKind,
    /// Individual requests in order
    pub requests: Vec<SubRequest>,
    /// CMC envelope, for CMC submissions
    pub cmc: Option<CmcEnvelope>,
}

fn children<'a>(buffer: &'a [u8], what: &str) -> Result<Vec<&'a [u8]>> {
    get_nested_tlvs(buffer).map_err(|e| match e {
        Error::BadRequest(m) => Error::BadRequest(format!("malformed {}: {}", what, m)),
        other => Error::BadRequest(format!("malformed {}: {}", what, other)),
    })
}

fn first_child<'a>(buffer: &'a [u8], what: &str) -> Result<&'a [u8]> {
    match children(buffer, what)?.first() {
        Some(c) => Ok(*c),
        None => Err(Error::BadRequest(format!("empty {}", what))),
    }
}

/// Decodes a PKCS #10 CertificationRequest.
pub fn decode_pkcs10(der: &[u8], seq_num: u32, body_part_id: BodyPartId) -> Result<SubRequest> {
    let request: CertReq = decode_value(der, "PKCS #10 request")?;
    let info = first_child(der, "PKCS #10 request")?.to_vec();
    Ok(SubRequest {
        seq_num,
        body_part_id,
        encoded: der.to_vec(),
        payload: RequestPayload::Pkcs10 { request, info },
    })
}

/// Decodes CRMF CertReqMessages. Each CertReqMsg yields one [`SubRequest`] identified by its
/// certReqId.
pub fn decode_crmf(der: &[u8]) -> Result<Vec<SubRequest>> {
    let messages: CertReqMessages = decode_value(der, "CRMF request")?;
    let encoded = children(der, "CRMF request")?;
    if messages.is_empty() || messages.len() != encoded.len() {
        return Err(Error::BadRequest("CRMF request contains no requests".to_string()));
    }
    let mut requests = vec![];
    for (seq_num, (message, enc)) in messages.into_iter().zip(encoded).enumerate() {
        let cert_request = first_child(enc, "CertReqMsg")?.to_vec();
        requests.push(SubRequest {
            seq_num: seq_num as u32,
            body_part_id: message.cert_req.cert_req_id,
            encoded: enc.to_vec(),
            payload: RequestPayload::Crmf {
                message,
                cert_request,
            },
        });
    }
    Ok(requests)
}

/// Extracts the encoded PKIData from a ContentInfo, returning it along with whether the
/// ContentInfo was signed.
fn unwrap_content_info(der: &[u8]) -> Result<(Vec<u8>, bool)> {
    let ci: ContentInfo = decode_value(der, "CMC request")?;
    match ci.content_type {
        ID_SIGNED_DATA => {
            let sd = ci
                .content
                .decode_as::<SignedData>()
                .map_err(|e| Error::BadRequest(format!("malformed SignedData: {}", e)))?;
            if sd.encap_content_info.econtent_type != ID_CCT_PKI_DATA {
                return Err(Error::BadRequest(format!(
                    "SignedData does not carry PKIData: {}",
                    cmc_oid_lookup(&sd.encap_content_info.econtent_type)
                )));
            }
            let econtent = match &sd.encap_content_info.econtent {
                Some(econtent) => econtent,
                None => {
                    return Err(Error::BadRequest(
                        "SignedData does not carry content".to_string(),
                    ))
                }
            };
            let os = econtent
                .decode_as::<OctetString>()
                .map_err(|e| Error::BadRequest(format!("malformed eContent: {}", e)))?;
            Ok((os.as_bytes().to_vec(), !sd.signer_infos.0.is_empty()))
        }
        ID_CCT_PKI_DATA => Ok((encode_value(&ci.content, "PKIData")?, false)),
        other => Err(Error::BadRequest(format!(
            "unsupported CMC content type: {}",
            cmc_oid_lookup(&other)
        ))),
    }
}

/// Decodes a CMC ContentInfo carrying PKIData, either directly or within SignedData.
pub fn decode_cmc(der: &[u8]) -> Result<DecodedSubmission> {
    let (pki_data_der, pre_signed) = unwrap_content_info(der)?;
    let pki_data: PkiData = decode_value(&pki_data_der, "PKIData")?;
    let sequences = children(&pki_data_der, "PKIData")?;
    if sequences.len() != 4 {
        return Err(Error::BadRequest("malformed PKIData".to_string()));
    }
    let req_sequence = sequences[1];
    let tagged_requests = children(req_sequence, "reqSequence")?;
    if tagged_requests.len() != pki_data.req_sequence.len() {
        return Err(Error::BadRequest("malformed reqSequence".to_string()));
    }

    let mut body_part_ids = vec![];
    body_part_ids.extend(pki_data.control_sequence.iter().map(|c| c.body_part_id));

    let mut requests = vec![];
    let mut seq_num = 0;
    for (tagged, enc) in pki_data.req_sequence.into_iter().zip(tagged_requests) {
        let (body_part_id, payload) = match tagged {
            TaggedRequest::Tcr(tcr) => {
                let cert_req = children(enc, "TaggedCertificationRequest")?;
                let cert_req = match cert_req.get(1) {
                    Some(cr) => *cr,
                    None => {
                        return Err(Error::BadRequest(
                            "malformed TaggedCertificationRequest".to_string(),
                        ))
                    }
                };
                let info = first_child(cert_req, "PKCS #10 request")?.to_vec();
                (
                    tcr.body_part_id,
                    RequestPayload::Pkcs10 {
                        request: tcr.certification_request,
                        info,
                    },
                )
            }
            TaggedRequest::Crm(message) => {
                let cert_request = first_child(enc, "CertReqMsg")?.to_vec();
                (
                    message.cert_req.cert_req_id,
                    RequestPayload::Crmf {
                        message,
                        cert_request,
                    },
                )
            }
            TaggedRequest::Orm(orm) => {
                log_message(
                    &EeLogLevels::EeError,
                    format!(
                        "Unsupported OtherRequestMessage of type {} in body part {}",
                        orm.request_message_type, orm.body_part_id
                    )
                    .as_str(),
                );
                return Err(Error::BadRequest(
                    "other request messages are not supported".to_string(),
                ));
            }
        };
        if requests
            .iter()
            .any(|r: &SubRequest| r.body_part_id == body_part_id)
        {
            return Err(Error::BadRequest(format!(
                "duplicate body part ID {} in reqSequence",
                body_part_id
            )));
        }
        body_part_ids.push(body_part_id);
        requests.push(SubRequest {
            seq_num,
            body_part_id,
            encoded: enc.to_vec(),
            payload,
        });
        seq_num += 1;
    }
    body_part_ids.extend(pki_data.cms_sequence.iter().map(|c| c.body_part_id));
    body_part_ids.extend(pki_data.other_msg_sequence.iter().map(|o| o.body_part_id));

    let controls = parse_controls(&pki_data.control_sequence)?;
    Ok(DecodedSubmission {
        kind: RequestKind::Cmc,
        requests,
        cmc: Some(CmcEnvelope {
            pre_signed,
            pki_data: pki_data_der.clone(),
            req_sequence: req_sequence.to_vec(),
            controls,
            cms_sequence: pki_data.cms_sequence,
            other_msgs: pki_data.other_msg_sequence,
            body_part_ids,
        }),
    })
}

/// Determines the kind of a DER-encoded request from its content.
fn detect_kind(der: &[u8]) -> Result<RequestKind> {
    if let Ok(ci) = ContentInfo::from_der(der) {
        if ci.content_type == ID_SIGNED_DATA || ci.content_type == ID_CCT_PKI_DATA {
            return Ok(RequestKind::Cmc);
        }
    }
    if CertReq::from_der(der).is_ok() {
        return Ok(RequestKind::Pkcs10);
    }
    if CertReqMessages::from_der(der).is_ok() {
        return Ok(RequestKind::Crmf);
    }
    Err(Error::BadRequest("unrecognized request".to_string()))
}

/// decode_submission normalizes the payload encoding and decodes the submission according to
/// `kind`. When `kind` is [`RequestKind::Unspecified`] the kind is determined from the content.
pub fn decode_submission(kind: RequestKind, payload: &[u8]) -> Result<DecodedSubmission> {
    let der = normalize_payload(payload)?;
    let kind = match kind {
        RequestKind::Unspecified => detect_kind(&der)?,
        k => k,
    };
    let decoded = match kind {
        RequestKind::Pkcs10 => DecodedSubmission {
            kind,
            requests: vec![decode_pkcs10(&der, 0, 0)?],
            cmc: None,
        },
        RequestKind::Crmf => DecodedSubmission {
            kind,
            requests: decode_crmf(&der)?,
            cmc: None,
        },
        RequestKind::Cmc => decode_cmc(&der)?,
        RequestKind::Unspecified => {
            return Err(Error::BadRequest("unrecognized request".to_string()))
        }
    };
    log_message(
        &EeLogLevels::EeDebug,
        format!(
            "Decoded {} submission with {} request(s)",
            decoded.kind,
            decoded.requests.len()
        )
        .as_str(),
    );
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;
    use core::str::FromStr;
    use der::Encode;

    fn pkcs10_der() -> Vec<u8> {
        let signer = RequestSigner::generate_p256();
        build_pkcs10(&signer, &Name::from_str("CN=decoder").unwrap(), &[], vec![])
            .unwrap()
            .to_der()
            .unwrap()
    }

    fn crmf_der() -> Vec<u8> {
        let signer = RequestSigner::generate_p256();
        let messages: Vec<CertReqMsg> = [3, 7]
            .iter()
            .map(|id| {
                let template = CertTemplate {
                    subject: Some(Name::from_str("CN=decoder").unwrap()),
                    ..Default::default()
                };
                build_cert_req_msg(
                    build_cert_request(*id, template, signer.spki().unwrap(), vec![]),
                    None,
                )
            })
            .collect();
        build_crmf(&messages).unwrap()
    }

    #[test]
    fn detect_kind_test() {
        let der = pkcs10_der();
        let decoded = decode_submission(RequestKind::Unspecified, &der).unwrap();
        assert_eq!(RequestKind::Pkcs10, decoded.kind);
        assert!(decoded.cmc.is_none());
        assert_eq!(der, decoded.requests[0].encoded);
        assert_eq!(
            Some("CN=decoder".to_string()),
            decoded.requests[0].subject().map(|n| n.to_string())
        );

        let decoded = decode_submission(RequestKind::Unspecified, &crmf_der()).unwrap();
        assert_eq!(RequestKind::Crmf, decoded.kind);
        assert_eq!(
            vec![3, 7],
            decoded
                .requests
                .iter()
                .map(|r| r.body_part_id)
                .collect::<Vec<_>>()
        );
        assert_eq!(
            vec![0, 1],
            decoded.requests.iter().map(|r| r.seq_num).collect::<Vec<_>>()
        );

        assert!(matches!(
            decode_submission(RequestKind::Unspecified, &[0x30, 0x03, 0x02, 0x01, 0x05]),
            Err(Error::BadRequest(_))
        ));
        // the stated kind is honored
        assert!(matches!(
            decode_submission(RequestKind::Crmf, &der),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn crmf_retains_cert_request_encoding_test() {
        let der = crmf_der();
        let subs = decode_crmf(&der).unwrap();
        for sub in &subs {
            match &sub.payload {
                RequestPayload::Crmf {
                    message,
                    cert_request,
                } => assert_eq!(&message.cert_req.to_der().unwrap(), cert_request),
                _ => panic!("expected CRMF"),
            }
            assert!(sub.public_key().is_some());
            assert!(sub.pop_link_witness().unwrap().is_none());
            assert!(sub.archive_options().unwrap().is_none());
            assert!(sub.requested_extensions().unwrap().is_empty());
        }
        assert!(matches!(decode_crmf(&[0x30, 0x00]), Err(Error::BadRequest(_))));
    }

    #[test]
    fn truncated_input_test() {
        let signer = RequestSigner::generate_p256();
        let req = build_pkcs10(&signer, &Name::from_str("CN=cmc").unwrap(), &[], vec![]).unwrap();
        let pki_data = build_pki_data(
            vec![identification_control(1, "alice").unwrap()],
            vec![TaggedRequest::Tcr(TaggedCertificationRequest {
                body_part_id: 2,
                certification_request: req,
            })],
        );
        let cmc = wrap_pki_data(&pki_data).unwrap();
        assert!(decode_submission(RequestKind::Cmc, &cmc).is_ok());

        for der in [pkcs10_der(), crmf_der(), cmc] {
            for len in 0..der.len() {
                let r = decode_submission(RequestKind::Unspecified, &der[..len]);
                assert!(
                    matches!(r, Err(Error::BadRequest(_))),
                    "prefix of {} bytes",
                    len
                );
            }
        }
    }

    #[test]
    fn duplicate_body_part_id_test() {
        let signer = RequestSigner::generate_p256();
        let tcr = |bpid| {
            TaggedRequest::Tcr(TaggedCertificationRequest {
                body_part_id: bpid,
                certification_request: build_pkcs10(
                    &signer,
                    &Name::from_str("CN=dup").unwrap(),
                    &[],
                    vec![],
                )
                .unwrap(),
            })
        };
        let pki_data = build_pki_data(vec![], vec![tcr(4), tcr(4)]);
        assert!(matches!(
            decode_cmc(&wrap_pki_data(&pki_data).unwrap()),
            Err(Error::BadRequest(_))
        ));

        let pki_data = build_pki_data(vec![], vec![tcr(4), tcr(5)]);
        let decoded = decode_cmc(&wrap_pki_data(&pki_data).unwrap()).unwrap();
        assert_eq!(2, decoded.requests.len());
        assert_eq!(vec![4, 5], decoded.cmc.unwrap().body_part_ids);
    }
}
