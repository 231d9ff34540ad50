//! JWT 令牌服务
//!
//! HS256 签名，声明为 `{iss, name, iat, exp}`。签发与过期判断都使用注入的时钟，
//! 过期时间点本身即视为过期（零宽限）。

use std::sync::Arc;

use application::{Clock, TokenError, TokenService};
use chrono::Duration;
use config::JwtConfig;
use domain::UserName;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use serde::{Deserialize, Serialize};

/// JWT Claims 结构
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtTokenService {
    issuer: String,
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl JwtTokenService {
    pub fn new(config: &JwtConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // exp 由注入的时钟判断
        validation.validate_exp = false;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        Self {
            issuer: config.issuer.clone(),
            ttl: Duration::hours(config.expiration_hours),
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            clock,
        }
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, name: &UserName) -> Result<String, TokenError> {
        let now = self.clock.now();
        let claims = Claims {
            iss: self.issuer.clone(),
            name: Some(name.as_str().to_owned()),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| TokenError::Encoding(err.to_string()))
    }

    fn verify(&self, token: &str) -> Result<UserName, TokenError> {
        let claims = self.decode_claims(token)?;
        if self.clock.now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        let name = claims.name.ok_or(TokenError::ClaimsMissing)?;
        UserName::parse(name).map_err(|_| TokenError::Invalid)
    }
}
