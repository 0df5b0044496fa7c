use std::sync::Mutex;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::config::Credential;
use crate::error::AscError;

const AUDIENCE: &str = "appstoreconnect-v1";
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    iat: i64,
    exp: i64,
    aud: &'a str,
}

struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Signs short-lived ES256 tokens from the API credential and reuses each one until it is
/// close to expiry.
pub struct TokenProvider {
    key_id: String,
    issuer_id: String,
    expiry_secs: i64,
    key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("expiry_secs", &self.expiry_secs)
            .finish()
    }
}

impl TokenProvider {
    pub fn new(credential: &Credential) -> Result<Self, AscError> {
        let key = EncodingKey::from_ec_pem(credential.private_key.expose_secret().as_bytes())
            .map_err(|e| AscError::InvalidPrivateKey(e.to_string()))?;

        Ok(Self {
            key_id: credential.key_id.clone(),
            issuer_id: credential.issuer_id.clone(),
            expiry_secs: i64::try_from(credential.expiry.as_secs()).unwrap_or(i64::MAX / 2),
            key,
            cached: Mutex::new(None),
        })
    }

    /// Token valid at the current wall-clock time.
    pub fn token(&self) -> Result<String, AscError> {
        self.token_at(chrono::Utc::now().timestamp())
    }

    /// Token valid at `now` (unix seconds). Regenerates once the cached token is within the
    /// refresh margin of its expiry.
    pub fn token_at(&self, now: i64) -> Result<String, AscError> {
        let mut slot = self
            .cached
            .lock()
            .map_err(|_| AscError::AuthenticationFailed("token cache poisoned".to_owned()))?;

        if let Some(cached) = slot.as_ref() {
            if cached.expires_at - now > self.refresh_margin() {
                return Ok(cached.value.clone());
            }
        }

        let expires_at = now + self.expiry_secs;
        let value = self.sign(now, expires_at)?;
        tracing::debug!(expires_at, "signed new API token");
        *slot = Some(CachedToken {
            value: value.clone(),
            expires_at,
        });
        Ok(value)
    }

    fn sign(&self, issued_at: i64, expires_at: i64) -> Result<String, AscError> {
        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.key_id.clone());
        header.typ = Some("JWT".to_owned());

        let claims = Claims {
            iss: &self.issuer_id,
            iat: issued_at,
            exp: expires_at,
            aud: AUDIENCE,
        };

        jsonwebtoken::encode(&header, &claims, &self.key)
            .map_err(|e| AscError::AuthenticationFailed(format!("cannot sign token: {e}")))
    }

    fn refresh_margin(&self) -> i64 {
        // Short expiries (tests, aggressive configs) refresh at the halfway point.
        REFRESH_MARGIN_SECS.min(self.expiry_secs / 2)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jsonwebtoken::{DecodingKey, Validation};
    use secrecy::SecretString;
    use serde::Deserialize;

    use super::*;

    const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/AuthKey_TEST.p8");
    const PUBLIC_KEY: &str = include_str!("../../tests/fixtures/AuthKey_TEST.pub.pem");

    fn credential(expiry: u64) -> Credential {
        Credential {
            key_id: "KEY123".into(),
            issuer_id: "issuer-uuid".into(),
            private_key: SecretString::from(PRIVATE_KEY.to_owned()),
            expiry: Duration::from_secs(expiry),
        }
    }

    #[derive(Deserialize)]
    struct DecodedClaims {
        iss: String,
        iat: i64,
        exp: i64,
        aud: String,
    }

    #[test]
    fn token_carries_key_id_and_claims() {
        let provider = TokenProvider::new(&credential(1200)).unwrap();
        let now = chrono::Utc::now().timestamp();
        let token = provider.token_at(now).unwrap();

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::ES256);
        assert_eq!(header.kid.as_deref(), Some("KEY123"));

        let mut validation = Validation::new(Algorithm::ES256);
        validation.set_audience(&[AUDIENCE]);
        let decoded = jsonwebtoken::decode::<DecodedClaims>(
            &token,
            &DecodingKey::from_ec_pem(PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();
        assert_eq!(decoded.claims.iss, "issuer-uuid");
        assert_eq!(decoded.claims.aud, AUDIENCE);
        assert_eq!(decoded.claims.iat, now);
        assert_eq!(decoded.claims.exp - decoded.claims.iat, 1200);
    }

    #[test]
    fn token_is_reused_until_refresh_margin() {
        let provider = TokenProvider::new(&credential(1200)).unwrap();
        let first = provider.token_at(1_000).unwrap();
        assert_eq!(provider.token_at(1_500).unwrap(), first);
        // 1_000 + 1200 - 60 = 2_140: inside the margin, must re-sign.
        let refreshed = provider.token_at(2_150).unwrap();
        assert_ne!(refreshed, first);
        assert_eq!(provider.token_at(2_200).unwrap(), refreshed);
    }

    #[test]
    fn short_expiry_refreshes_at_half_life() {
        let provider = TokenProvider::new(&credential(10)).unwrap();
        let first = provider.token_at(100).unwrap();
        assert_eq!(provider.token_at(104).unwrap(), first);
        assert_ne!(provider.token_at(105).unwrap(), first);
    }

    #[test]
    fn garbage_key_is_rejected() {
        let mut bad = credential(1200);
        bad.private_key = SecretString::from("not a key".to_owned());
        assert!(matches!(
            TokenProvider::new(&bad),
            Err(AscError::InvalidPrivateKey(_))
        ));
    }
}
