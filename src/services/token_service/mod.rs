pub mod error;
pub mod models;
pub mod settings;

use std::collections::BTreeMap;

use base64::{engine::general_purpose, Engine};
use chrono::{DateTime, Duration, Utc};
use derive_more::Constructor;
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use rand::{rngs::OsRng, Rng};
use sha2::Sha256;

use self::{settings::TokenSettings, error::{Result, TokenError}, models::AuthTokensModel};

const REFRESH_TOKEN_LENGTH: usize = 128;

pub trait TokenService: Send + Sync {
    ///
    /// Generates a signed JWT carrying the given `user_id`, and a series of
    /// random bytes representing a refresh token.
    ///
    fn generate_auth_tokens(&self, user_id: i64) -> Result<AuthTokensModel>;

    ///
    /// Verifies a JWT `access_token`, and returns the user ID from its claims
    /// on successful verification. Returns `Error` if the signature doesn't
    /// match, or the token is stale
    ///
    fn verify_access_token(&self, access_token: &str) -> Result<i64>;
}

#[derive(Clone, Constructor)]
pub struct CoreTokenService {
    settings: TokenSettings
}

impl CoreTokenService {
    fn key(&self) -> Result<Hmac<Sha256>> {
        Hmac::new_from_slice(self.settings.jwt_secret.as_bytes()).map_err(|_| TokenError::InvalidKey)
    }
}

impl TokenService for CoreTokenService {
    fn generate_auth_tokens(&self, user_id: i64) -> Result<AuthTokensModel> {
        let key = self.key()?;
        let now = Utc::now();

        let mut claims = BTreeMap::new();
        claims.insert("user_id", user_id.to_string());
        claims.insert("expires", (now + Duration::seconds(self.settings.jwt_lifetime_s)).to_rfc3339());

        let access_token = claims.sign_with_key(&key)?;

        Ok(AuthTokensModel {
            access_token,
            refresh_token: generate_random_bytes(),
            refresh_expires_on: (now + Duration::seconds(self.settings.refr_token_lifetime_s)).naive_utc(),
        })
    }

    fn verify_access_token(&self, access_token: &str) -> Result<i64> {
        let key = self.key()?;

        // Verify the JWT using the hash key
        let claims: BTreeMap<String, String> = access_token.verify_with_key(&key)?;

        let expires = claims.get("expires")
            .and_then(|e| DateTime::parse_from_rfc3339(e).ok())
            .ok_or(TokenError::MalformedClaims)?;
        if Utc::now() > expires {
            return Err(TokenError::TokenStale);
        }

        claims.get("user_id")
            .and_then(|id| id.parse::<i64>().ok())
            .ok_or(TokenError::MalformedClaims)
    }
}

///
/// Generates a series of random, OS bytes, with a length equal to `REFRESH_TOKEN_LENGTH`
///
fn generate_random_bytes() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_LENGTH];
    OsRng.fill(&mut bytes[..]);

    general_purpose::STANDARD_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose;
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Serialize)]
    struct TokenContents {
        user_id: String,
        expires: String,
    }

    fn service(jwt_lifetime_s: i64) -> CoreTokenService {
        CoreTokenService::new(TokenSettings {
            jwt_lifetime_s,
            refr_token_lifetime_s: 5,
            jwt_secret: "test-secret".to_string(),
        })
    }

    #[test]
    fn test_token_gen_and_verify() {
        let svc = service(5);
        let user_id = 10;

        let tokens = svc.generate_auth_tokens(user_id).unwrap();

        assert_eq!(svc.verify_access_token(&tokens.access_token).unwrap(), user_id);
        assert_ne!(tokens.access_token, tokens.refresh_token);
    }

    #[test]
    fn test_stale_token() {
        let svc = service(-5);
        let tokens = svc.generate_auth_tokens(10).unwrap();

        assert!(matches!(svc.verify_access_token(&tokens.access_token), Err(TokenError::TokenStale)));
    }

    #[test]
    fn test_token_from_other_secret() {
        let tokens = service(5).generate_auth_tokens(10).unwrap();
        let other = CoreTokenService::new(TokenSettings {
            jwt_lifetime_s: 5,
            refr_token_lifetime_s: 5,
            jwt_secret: "other-secret".to_string(),
        });

        assert!(other.verify_access_token(&tokens.access_token).is_err());
    }

    #[test]
    fn test_improper_token() {
        let svc = service(5);
        let tokens = svc.generate_auth_tokens(10).unwrap();

        // Grab the content of the JWT, deserialize it, and swap the user ID
        // to attempt to impersonate another player
        let str = tokens.access_token.split('.').nth(1).unwrap();
        let str = general_purpose::URL_SAFE_NO_PAD.decode(str).unwrap();
        let mut contents: TokenContents = serde_json::from_slice(&str).unwrap();

        contents.user_id = "11".to_string();

        // Build the new token with the new user ID, but with the same
        // header and signature
        let new_token = format!(
            "{}.{}.{}",
            tokens.access_token.split('.').next().unwrap(),
            general_purpose::URL_SAFE_NO_PAD.encode(serde_json::to_string(&contents).unwrap()),
            tokens.access_token.split('.').nth(2).unwrap()
        );

        // Assert that an error is thrown when the token is attempted to
        // be verified
        assert!(svc.verify_access_token(&new_token).is_err());
    }
}
