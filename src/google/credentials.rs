use base64::prelude::{BASE64_STANDARD, BASE64_URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use ring::signature::RsaKeyPair;
use serde::{Deserialize, Serialize};

use crate::error::{SheetError, TallyError};

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Serialize)]
struct JwtHeader {
    alg: &'static str,
    typ: &'static str,
}

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// True once the token is within a minute of expiring.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(60) >= self.expires_at
    }
}

impl ServiceAccount {
    pub fn try_from_str(input: &str) -> Result<Self, TallyError> {
        serde_json::from_str(input)
            .map_err(|e| TallyError::Credentials(format!("service account json: {e}")))
    }

    /// Decode base64-wrapped service account JSON, as found in the environment.
    pub fn from_base64(encoded: &str) -> Result<Self, TallyError> {
        let bytes = BASE64_STANDARD
            .decode(encoded.trim())
            .map_err(|e| TallyError::Credentials(format!("base64: {e}")))?;
        let json = String::from_utf8(bytes)
            .map_err(|e| TallyError::Credentials(format!("utf-8: {e}")))?;
        Self::try_from_str(&json)
    }

    /// Self-signed RS256 assertion for the JWT bearer grant.
    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String, SheetError> {
        let claims = JwtClaims {
            iss: &self.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let header = JwtHeader {
            alg: "RS256",
            typ: "JWT",
        };

        let header_b64 = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_string(&header)?);
        let claims_b64 = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_string(&claims)?);
        let signing_input = format!("{}.{}", header_b64, claims_b64);

        let mut reader = std::io::Cursor::new(self.private_key.as_bytes());
        let key = rustls_pemfile::read_one(&mut reader)
            .map_err(|e| SheetError::Auth(format!("invalid PEM private key: {e}")))?;
        let key_pair = match key {
            Some(rustls_pemfile::Item::Pkcs8Key(der)) => {
                RsaKeyPair::from_pkcs8(der.secret_pkcs8_der())
                    .map_err(|_| SheetError::Auth("bad pkcs8 rsa key".to_string()))?
            }
            Some(rustls_pemfile::Item::Pkcs1Key(der)) => {
                RsaKeyPair::from_der(der.secret_pkcs1_der())
                    .map_err(|_| SheetError::Auth("bad pkcs1 rsa key".to_string()))?
            }
            _ => return Err(SheetError::Auth("missing private key".to_string())),
        };

        let mut signature = vec![0; key_pair.public().modulus_len()];
        key_pair
            .sign(
                &ring::signature::RSA_PKCS1_SHA256,
                &ring::rand::SystemRandom::new(),
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|_| SheetError::Auth("failed to sign assertion".to_string()))?;

        Ok(format!("{}.{}", signing_input, BASE64_URL_SAFE_NO_PAD.encode(&signature)))
    }

    /// Trade a signed assertion for a bearer token.
    pub fn fetch_access_token(
        &self,
        client: &reqwest::blocking::Client,
    ) -> Result<AccessToken, SheetError> {
        let now = Utc::now();
        let jwt = self.signed_assertion(now)?;
        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", jwt.as_str()),
        ];

        let response = client.post(&self.token_uri).form(&params).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SheetError::Auth(format!(
                "token endpoint returned {status}: {}",
                response.text().unwrap_or_default()
            )));
        }

        let token: TokenResponse = response.json()?;
        Ok(AccessToken {
            token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}
