/**
 * Web-Push Backend
 *
 * Posts to the browser push service endpoint stored in the registration, with
 * the message lifetime (`TTL`) and `Urgency: high`. When the registration
 * carries `p256dh` and `auth` keys the JSON payload is encrypted as a single
 * `aes128gcm` record (RFC 8291). Without keys the request has no body and
 * only wakes the service worker.
 * When VAPID keys are configured every request carries
 * `Authorization: vapid t=<jwt>, k=<public key>`, where the JWT is an ES256
 * token whose audience is the origin of the endpoint.
 */

use aes_gcm::aead::{rand_core::RngCore, Aead, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Nonce};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hkdf::Hkdf;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use p256::ecdh::EphemeralSecret;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::PublicKey;
use reqwest::header::{AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::Serialize;
use sha2::Sha256;

use crate::backend::push::backend::{PushBackend, PushError};
use crate::backend::server::config::VapidConfig;
use crate::shared::notification::{
    NotificationPayload, NotificationSubscription, PushChannel, SubscriptionKeys,
};

/// VAPID tokens are valid for 12 hours
const VAPID_TOKEN_HOURS: i64 = 12;

/// Record size announced in the content-coding header
const RECORD_SIZE: u32 = 4096;

/// Padding delimiter plus the GCM tag
const RECORD_OVERHEAD: usize = 1 + 16;

fn decode_key(value: &str, name: &str) -> Result<Vec<u8>, PushError> {
    URL_SAFE_NO_PAD
        .decode(value.trim_end_matches('='))
        .map_err(|e| PushError::Encryption(format!("{} is not base64url: {}", name, e)))
}

fn hkdf_expand(salt: &[u8], ikm: &[u8], info: &[u8], out: &mut [u8]) -> Result<(), PushError> {
    Hkdf::<Sha256>::new(Some(salt), ikm)
        .expand(info, out)
        .map_err(|e| PushError::Encryption(e.to_string()))
}

/// Encrypt `plaintext` for one registration as an `aes128gcm` body
///
/// The body is `salt || rs || idlen || keyid || ciphertext` where `keyid` is
/// the uncompressed ephemeral public key of this message.
pub fn encrypt_payload(keys: &SubscriptionKeys, plaintext: &[u8]) -> Result<Vec<u8>, PushError> {
    if plaintext.len() + RECORD_OVERHEAD > RECORD_SIZE as usize {
        return Err(PushError::Encryption(format!(
            "payload of {} bytes does not fit one record",
            plaintext.len()
        )));
    }

    let auth = decode_key(&keys.auth, "auth")?;
    let ua_key = PublicKey::from_sec1_bytes(&decode_key(&keys.p256dh, "p256dh")?)
        .map_err(|_| PushError::Encryption("p256dh is not a P-256 public key".to_string()))?;
    let ua_public = ua_key.to_encoded_point(false);

    let secret = EphemeralSecret::random(&mut OsRng);
    let as_public = secret.public_key().to_encoded_point(false);
    let shared = secret.diffie_hellman(&ua_key);

    let mut key_info = b"WebPush: info\0".to_vec();
    key_info.extend_from_slice(ua_public.as_bytes());
    key_info.extend_from_slice(as_public.as_bytes());
    let mut ikm = [0u8; 32];
    hkdf_expand(&auth, shared.raw_secret_bytes().as_slice(), &key_info, &mut ikm)?;

    let mut salt = [0u8; 16];
    OsRng.fill_bytes(&mut salt);
    let mut cek = [0u8; 16];
    hkdf_expand(&salt, &ikm, b"Content-Encoding: aes128gcm\0", &mut cek)?;
    let mut nonce = [0u8; 12];
    hkdf_expand(&salt, &ikm, b"Content-Encoding: nonce\0", &mut nonce)?;

    // Last (and only) record
    let mut record = Vec::with_capacity(plaintext.len() + 1);
    record.extend_from_slice(plaintext);
    record.push(0x02);

    let cipher = Aes128Gcm::new_from_slice(&cek).map_err(|e| PushError::Encryption(e.to_string()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), record.as_slice())
        .map_err(|e| PushError::Encryption(e.to_string()))?;

    let key_id = as_public.as_bytes();
    let mut body = Vec::with_capacity(salt.len() + 5 + key_id.len() + ciphertext.len());
    body.extend_from_slice(&salt);
    body.extend_from_slice(&RECORD_SIZE.to_be_bytes());
    body.push(key_id.len() as u8);
    body.extend_from_slice(key_id);
    body.extend_from_slice(&ciphertext);
    Ok(body)
}

#[derive(Debug, Serialize)]
struct VapidClaims<'a> {
    aud: String,
    exp: i64,
    sub: &'a str,
}

/// Signs VAPID authorization headers
#[derive(Clone)]
pub struct VapidSigner {
    subject: String,
    public_key: String,
    key: EncodingKey,
}

impl VapidSigner {
    pub fn from_config(config: &VapidConfig) -> Result<Self, PushError> {
        let key = EncodingKey::from_ec_pem(config.private_key_pem.as_bytes())
            .map_err(|e| PushError::Vapid(format!("invalid private key: {}", e)))?;

        Ok(Self {
            subject: config.subject.clone(),
            public_key: config.public_key.clone(),
            key,
        })
    }

    /// `Authorization` header value for a request to `endpoint`
    pub fn authorization(&self, endpoint: &str) -> Result<String, PushError> {
        let url = Url::parse(endpoint).map_err(|e| PushError::Vapid(format!("bad endpoint: {}", e)))?;
        let claims = VapidClaims {
            aud: url.origin().ascii_serialization(),
            exp: (Utc::now() + Duration::hours(VAPID_TOKEN_HOURS)).timestamp(),
            sub: &self.subject,
        };

        let token = encode(&Header::new(Algorithm::ES256), &claims, &self.key)
            .map_err(|e| PushError::Vapid(e.to_string()))?;

        Ok(format!("vapid t={}, k={}", token, self.public_key))
    }
}

#[derive(Clone)]
pub struct WebPushBackend {
    client: Client,
    ttl: u32,
    vapid: Option<VapidSigner>,
}

impl WebPushBackend {
    pub fn new(client: Client, ttl: u32, vapid: Option<VapidSigner>) -> Self {
        Self { client, ttl, vapid }
    }
}

#[async_trait]
impl PushBackend for WebPushBackend {
    fn channel(&self) -> PushChannel {
        PushChannel::Web
    }

    async fn deliver(
        &self,
        subscription: &NotificationSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), PushError> {
        let mut request = self
            .client
            .post(&subscription.endpoint)
            .header("TTL", self.ttl.to_string())
            .header("Urgency", "high");

        if let Some(keys) = &subscription.keys {
            let plaintext =
                serde_json::to_vec(payload).map_err(|e| PushError::Encryption(e.to_string()))?;
            request = request
                .header(CONTENT_ENCODING, "aes128gcm")
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(encrypt_payload(keys, &plaintext)?);
        } else {
            tracing::debug!("Subscription {} has no keys, sending an empty push", subscription.id);
        }

        if let Some(vapid) = &self.vapid {
            request = request.header(AUTHORIZATION, vapid.authorization(&subscription.endpoint)?);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(PushError::from_status(status.as_u16(), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdh::diffie_hellman;
    use p256::SecretKey;

    /// Receiving side of the content coding, as a browser would run it
    fn decrypt(secret: &SecretKey, auth: &[u8], body: &[u8]) -> Vec<u8> {
        let (salt, rest) = body.split_at(16);
        assert_eq!(u32::from_be_bytes(rest[..4].try_into().unwrap()), RECORD_SIZE);
        let id_len = rest[4] as usize;
        let (key_id, ciphertext) = rest[5..].split_at(id_len);

        let as_key = PublicKey::from_sec1_bytes(key_id).unwrap();
        let shared = diffie_hellman(secret.to_nonzero_scalar(), as_key.as_affine());

        let mut key_info = b"WebPush: info\0".to_vec();
        key_info.extend_from_slice(secret.public_key().to_encoded_point(false).as_bytes());
        key_info.extend_from_slice(key_id);
        let mut ikm = [0u8; 32];
        hkdf_expand(auth, shared.raw_secret_bytes().as_slice(), &key_info, &mut ikm).unwrap();

        let mut cek = [0u8; 16];
        hkdf_expand(salt, &ikm, b"Content-Encoding: aes128gcm\0", &mut cek).unwrap();
        let mut nonce = [0u8; 12];
        hkdf_expand(salt, &ikm, b"Content-Encoding: nonce\0", &mut nonce).unwrap();

        Aes128Gcm::new_from_slice(&cek)
            .unwrap()
            .decrypt(Nonce::from_slice(&nonce), ciphertext)
            .unwrap()
    }

    fn browser_keys() -> (SecretKey, [u8; 16], SubscriptionKeys) {
        let secret = SecretKey::random(&mut OsRng);
        let mut auth = [0u8; 16];
        OsRng.fill_bytes(&mut auth);
        let keys = SubscriptionKeys {
            p256dh: URL_SAFE_NO_PAD.encode(secret.public_key().to_encoded_point(false).as_bytes()),
            auth: URL_SAFE_NO_PAD.encode(auth),
        };
        (secret, auth, keys)
    }

    #[test]
    fn test_payload_decrypts_with_browser_keys() {
        let (secret, auth, keys) = browser_keys();
        let plaintext = br#"{"title":"Hello","body":"World"}"#;

        let body = encrypt_payload(&keys, plaintext).unwrap();
        assert_eq!(body[20], 65);
        assert_eq!(body[21], 0x04);
        assert!(!body.windows(5).any(|w| w == b"Hello"));

        let record = decrypt(&secret, &auth, &body);
        assert_eq!(record.last(), Some(&0x02));
        assert_eq!(&record[..record.len() - 1], plaintext);
    }

    #[test]
    fn test_each_message_uses_fresh_salt_and_key() {
        let (_, _, keys) = browser_keys();
        let first = encrypt_payload(&keys, b"same").unwrap();
        let second = encrypt_payload(&keys, b"same").unwrap();
        assert_ne!(first[..16], second[..16]);
        assert_ne!(first[21..86], second[21..86]);
    }

    #[test]
    fn test_bad_keys_are_rejected() {
        let (_, _, keys) = browser_keys();
        let not_a_point = SubscriptionKeys {
            p256dh: URL_SAFE_NO_PAD.encode([7u8; 65]),
            ..keys.clone()
        };
        let not_base64 = SubscriptionKeys {
            auth: "***".to_string(),
            ..keys.clone()
        };
        for bad in [not_a_point, not_base64] {
            match encrypt_payload(&bad, b"x") {
                Err(PushError::Encryption(_)) => {}
                other => panic!("Expected Encryption error, got {:?}", other.map(|b| b.len())),
            }
        }
        assert!(encrypt_payload(&keys, &vec![b'a'; RECORD_SIZE as usize]).is_err());
    }

    #[test]
    fn test_invalid_vapid_key_is_rejected() {
        let config = VapidConfig {
            subject: "mailto:admin@example.com".to_string(),
            public_key: "BPublicKey".to_string(),
            private_key_pem: "not a pem".to_string(),
        };
        match VapidSigner::from_config(&config) {
            Err(PushError::Vapid(_)) => {}
            _ => panic!("Expected Vapid error"),
        }
    }
}
