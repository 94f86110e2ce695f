//! TSIG key handling and message signing
//!
//! `TsigKey` signs outgoing updates and checks the signature on the
//! answer. HMAC-MD5, HMAC-SHA1, HMAC-SHA256 and HMAC-SHA512 are all
//! computed here, so every algorithm BIND-style servers commonly accept
//! is available regardless of the DNS library's crypto backend.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hickory_proto::error::{ProtoError, ProtoResult};
use hickory_proto::op::{Message, MessageFinalizer, MessageVerifier, ResponseCode};
use hickory_proto::rr::dnssec::rdata::DNSSECRData;
use hickory_proto::rr::dnssec::rdata::tsig::{
    TSIG, TsigAlgorithm, make_tsig_record, message_tbs, signed_bitmessage_to_buf,
};
use hickory_proto::rr::{Name, RData, Record};
use hickory_proto::xfer::DnsResponse;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use std::fmt;
use std::str::FromStr;
use zonesync_core::{Error, Result};

/// Allowed clock skew between signer and verifier, in seconds
pub const TSIG_FUDGE_SECS: u16 = 300;

/// Parse an algorithm name
///
/// Case-insensitive, with an optional `HMAC` / `hmac-` prefix:
/// `SHA256`, `hmac-sha256` and `HMACSHA256` are all HMAC-SHA256.
pub fn parse_algorithm(name: &str) -> Result<TsigAlgorithm> {
    let normalized = name.trim().trim_end_matches('.').to_ascii_uppercase().replace('-', "");
    let normalized = normalized.trim_end_matches(".SIGALG.REG.INT");
    let bare = normalized.strip_prefix("HMAC").unwrap_or(normalized);

    match bare {
        "MD5" => Ok(TsigAlgorithm::HmacMd5),
        "SHA1" => Ok(TsigAlgorithm::HmacSha1),
        "SHA256" => Ok(TsigAlgorithm::HmacSha256),
        "SHA512" => Ok(TsigAlgorithm::HmacSha512),
        _ => Err(Error::config(format!("Unsupported TSIG algorithm: {name}"))),
    }
}

fn hmac_sign<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> ProtoResult<Vec<u8>> {
    let mut mac = <M as KeyInit>::new_from_slice(key)
        .map_err(|e| ProtoError::from(format!("invalid TSIG key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hmac_verify<M: Mac + KeyInit>(key: &[u8], data: &[u8], tag: &[u8]) -> bool {
    match <M as KeyInit>::new_from_slice(key) {
        Ok(mut mac) => {
            mac.update(data);
            mac.verify_slice(tag).is_ok()
        }
        Err(_) => false,
    }
}

/// Validated TSIG material
#[derive(Clone)]
pub struct TsigKey {
    name: Name,
    algorithm: TsigAlgorithm,
    secret: Vec<u8>,
}

impl TsigKey {
    /// Build a key from the three optional settings
    ///
    /// All absent means unsigned (`Ok(None)`); a partial set is an error.
    pub fn from_parts(
        secret: Option<&str>,
        key_name: Option<&str>,
        algorithm: Option<&str>,
    ) -> Result<Option<Self>> {
        let present = |v: Option<&str>| v.is_some_and(|s| !s.trim().is_empty());

        let (secret, key_name, algorithm) = match (secret, key_name, algorithm) {
            (s, k, a) if !present(s) && !present(k) && !present(a) => return Ok(None),
            (Some(s), Some(k), Some(a)) if present(Some(s)) && present(Some(k)) && present(Some(a)) => {
                (s, k, a)
            }
            (s, k, a) => {
                let missing: Vec<&str> = [
                    (present(s), "tsig_secret"),
                    (present(k), "tsig_key_name"),
                    (present(a), "tsig_algorithm"),
                ]
                .into_iter()
                .filter_map(|(set, field)| (!set).then_some(field))
                .collect();
                return Err(Error::incomplete_tsig(format!("missing {}", missing.join(", "))));
            }
        };

        let secret = BASE64
            .decode(secret.trim())
            .map_err(|e| Error::config(format!("TSIG secret is not valid base64: {e}")))?;

        let key_name = key_name.trim();
        let fqdn = if key_name.ends_with('.') {
            key_name.to_string()
        } else {
            format!("{key_name}.")
        };
        let name = Name::from_str(&fqdn)
            .map_err(|e| Error::config(format!("Invalid TSIG key name {key_name}: {e}")))?;

        Ok(Some(Self {
            name,
            algorithm: parse_algorithm(algorithm)?,
            secret,
        }))
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn algorithm(&self) -> &TsigAlgorithm {
        &self.algorithm
    }

    /// HMAC of `data` under this key
    pub fn mac(&self, data: &[u8]) -> ProtoResult<Vec<u8>> {
        match self.algorithm {
            TsigAlgorithm::HmacMd5 => hmac_sign::<Hmac<Md5>>(&self.secret, data),
            TsigAlgorithm::HmacSha1 => hmac_sign::<Hmac<Sha1>>(&self.secret, data),
            TsigAlgorithm::HmacSha256 => hmac_sign::<Hmac<Sha256>>(&self.secret, data),
            TsigAlgorithm::HmacSha512 => hmac_sign::<Hmac<Sha512>>(&self.secret, data),
            ref other => Err(ProtoError::from(format!("unsupported TSIG algorithm {other}"))),
        }
    }

    /// Constant-time MAC comparison
    fn verify_mac(&self, data: &[u8], tag: &[u8]) -> bool {
        match self.algorithm {
            TsigAlgorithm::HmacMd5 => hmac_verify::<Hmac<Md5>>(&self.secret, data, tag),
            TsigAlgorithm::HmacSha1 => hmac_verify::<Hmac<Sha1>>(&self.secret, data, tag),
            TsigAlgorithm::HmacSha256 => hmac_verify::<Hmac<Sha256>>(&self.secret, data, tag),
            TsigAlgorithm::HmacSha512 => hmac_verify::<Hmac<Sha512>>(&self.secret, data, tag),
            _ => false,
        }
    }

    /// Check the answer to a request signed with `request_mac` at `signed_at`
    ///
    /// Servers answer key and signature failures unsigned, so an unsigned
    /// answer carrying an error code is passed through for its code.
    fn verify_response(
        &self,
        request_mac: &[u8],
        signed_at: u64,
        response: &[u8],
    ) -> ProtoResult<DnsResponse> {
        let (tbv, record) = match signed_bitmessage_to_buf(Some(request_mac), response, true) {
            Ok(parts) => parts,
            Err(e) => {
                let message = Message::from_vec(response)?;
                if message.response_code() != ResponseCode::NoError {
                    return Ok(DnsResponse::new(message, response.to_vec()));
                }
                return Err(ProtoError::from(format!("unsigned answer to signed update: {e}")));
            }
        };

        let tsig = match record.data() {
            Some(RData::DNSSEC(DNSSECRData::TSIG(tsig))) => tsig,
            _ => return Err(ProtoError::from("answer carries no TSIG record")),
        };

        if record.name() != &self.name || tsig.algorithm() != &self.algorithm {
            return Err(ProtoError::from("answer signed with a different TSIG key"));
        }
        if !self.verify_mac(&tbv, tsig.mac()) {
            return Err(ProtoError::from("TSIG validation failed: invalid signature"));
        }

        let fudge = u64::from(tsig.fudge());
        let window = tsig.time().saturating_sub(fudge)..=tsig.time().saturating_add(fudge);
        if !window.contains(&signed_at) {
            return Err(ProtoError::from("TSIG validation failed: answer outside time window"));
        }

        Ok(DnsResponse::new(Message::from_vec(response)?, response.to_vec()))
    }
}

impl MessageFinalizer for TsigKey {
    fn finalize_message(
        &self,
        message: &Message,
        current_time: u32,
    ) -> ProtoResult<(Vec<Record>, Option<MessageVerifier>)> {
        let signed_at = u64::from(current_time);
        let pre_tsig = TSIG::new(
            self.algorithm.clone(),
            signed_at,
            TSIG_FUDGE_SECS,
            Vec::new(),
            message.id(),
            0,
            Vec::new(),
        );

        let request_mac = self.mac(&message_tbs(None, message, &pre_tsig, &self.name)?)?;
        let record = make_tsig_record(self.name.clone(), pre_tsig.set_mac(request_mac.clone()));

        let key = self.clone();
        let verifier = move |response: &[u8]| key.verify_response(&request_mac, signed_at, response);

        Ok((vec![record], Some(Box::new(verifier))))
    }
}

impl fmt::Debug for TsigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TsigKey")
            .field("name", &self.name.to_string())
            .field("algorithm", &self.algorithm)
            .field("secret", &"<REDACTED>")
            .finish()
    }
}
