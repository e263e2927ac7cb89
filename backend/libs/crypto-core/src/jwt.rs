/// JWT issuance and validation for post platform services
///
/// Tokens are signed with RS256 (RSA with SHA-256) only. Symmetric algorithms
/// are never accepted, which rules out algorithm confusion attacks.
///
/// ## Key lifecycle
///
/// Keys are parsed once at startup into a [`JwtKeys`] value and handed to the
/// HTTP layer as application state. Nothing is stored in process-wide globals,
/// so tests and services can hold several independent key sets.
///
/// ```rust,ignore
/// use crypto_core::jwt::JwtKeys;
///
/// let keys = JwtKeys::from_env()?;
/// let claims = keys.validate_token(&token)?.claims;
/// ```
use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Matches the one hour lifetime the web client assumes for stored tokens.
const ACCESS_TOKEN_EXPIRY_SECS: i64 = 3600;

/// The only `token_type` accepted as a bearer credential
pub const ACCESS_TOKEN_TYPE: &str = "access";

/// JWT algorithm - MUST be RS256
const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

// ============================================================================
// Data Structures
// ============================================================================

/// JWT claims: standard registered claims plus the display fields that posts
/// snapshot from their author.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token type, always "access" for tokens accepted by the API
    pub token_type: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Avatar URL
    #[serde(default)]
    pub avatar: String,
}

impl Claims {
    /// Parse the subject as a user id.
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow!("Invalid user ID format in token: {e}"))
    }
}

/// Identity written into a freshly issued token.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub user_id: Uuid,
    pub name: String,
    pub avatar: String,
}

// ============================================================================
// Keys
// ============================================================================

/// Parsed RS256 key material.
///
/// A validation-only instance (no private key) is what API services run with;
/// the signing half is only needed by the identity provider and by tests.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Option<EncodingKey>,
    decoding: DecodingKey,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("can_sign", &self.encoding.is_some())
            .finish()
    }
}

impl JwtKeys {
    /// Build a key set that can sign and validate.
    ///
    /// ## Errors
    ///
    /// Returns error if either PEM is malformed or not an RSA key.
    pub fn from_pem(private_key_pem: &str, public_key_pem: &str) -> Result<Self> {
        let encoding = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| anyhow!("Failed to parse RSA private key: {e}"))?;
        let mut keys = Self::validation_only(public_key_pem)?;
        keys.encoding = Some(encoding);
        Ok(keys)
    }

    /// Build a key set that can only validate tokens.
    pub fn validation_only(public_key_pem: &str) -> Result<Self> {
        let decoding = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;
        Ok(Self {
            encoding: None,
            decoding,
        })
    }

    /// Load keys from the environment.
    ///
    /// The public key comes from `JWT_PUBLIC_KEY_PEM`, or from the file named by
    /// `JWT_PUBLIC_KEY_FILE`. When `JWT_PRIVATE_KEY_PEM` is also present the
    /// resulting key set can sign tokens.
    pub fn from_env() -> Result<Self> {
        let public_key = load_pem("JWT_PUBLIC_KEY_PEM", "JWT_PUBLIC_KEY_FILE")?;

        match std::env::var("JWT_PRIVATE_KEY_PEM") {
            Ok(private_key) => Self::from_pem(&private_key, &public_key),
            Err(_) => Self::validation_only(&public_key),
        }
    }

    /// Whether this key set holds a private key.
    pub fn can_sign(&self) -> bool {
        self.encoding.is_some()
    }

    /// Issue an access token for `subject`.
    pub fn generate_access_token(&self, subject: &TokenSubject) -> Result<String> {
        self.generate_token_with_ttl(subject, Duration::seconds(ACCESS_TOKEN_EXPIRY_SECS))
    }

    /// Issue an access token with an explicit lifetime. A negative lifetime
    /// yields an already-expired token.
    pub fn generate_token_with_ttl(&self, subject: &TokenSubject, ttl: Duration) -> Result<String> {
        let encoding = self
            .encoding
            .as_ref()
            .ok_or_else(|| anyhow!("JWT private key not configured; this key set is validation-only"))?;

        let now = Utc::now();
        let claims = Claims {
            sub: subject.user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            name: subject.name.clone(),
            avatar: subject.avatar.clone(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, encoding)
            .map_err(|e| anyhow!("Failed to generate access token: {e}"))
    }

    /// Validate and decode a JWT token
    ///
    /// ## Security Guarantees
    ///
    /// - Verifies the RS256 signature
    /// - Checks token expiration
    /// - NO fallback to weaker algorithms
    pub fn validate_token(&self, token: &str) -> Result<TokenData<Claims>> {
        self.decode_claims(token, true)
            .map_err(|e| anyhow!("Token validation failed: {e}"))
    }

    /// Signature-checked decode with optional expiry enforcement.
    pub(crate) fn decode_claims(
        &self,
        token: &str,
        validate_exp: bool,
    ) -> std::result::Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = validate_exp;
        decode::<Claims>(token, &self.decoding, &validation)
    }
}

fn load_pem(inline_var: &str, file_var: &str) -> Result<String> {
    if let Ok(pem) = std::env::var(inline_var) {
        return Ok(pem);
    }

    let path = std::env::var(file_var)
        .map_err(|_| anyhow!("Neither {inline_var} nor {file_var} is set"))?;
    std::fs::read_to_string(&path).with_context(|| format!("Failed to read {file_var}={path}"))
}

// ============================================================================
// Tests
// ============================================================================
