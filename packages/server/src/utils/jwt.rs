use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject id of the caller
    pub exp: usize,  // Expiration timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl Claims {
    /// Claims for `subject` expiring `ttl` from now.
    pub fn for_subject(subject: &str, ttl: Duration) -> Result<Self> {
        let expiration = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| anyhow::anyhow!("token expiry overflows"))?
            .timestamp();

        Ok(Self {
            sub: subject.to_owned(),
            exp: usize::try_from(expiration)?,
            iss: None,
            aud: None,
        })
    }
}

/// Sign claims with an HMAC secret (HS256).
pub fn sign(secret: &[u8], claims: &Claims) -> Result<String> {
    let token = encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret),
    )?;

    Ok(token)
}

/// Verify and decode a JWT token.
pub fn verify(token: &str, key: &DecodingKey, validation: &Validation) -> Result<Claims> {
    let token_data = decode::<Claims>(token, key, validation)?;
    Ok(token_data.claims)
}
