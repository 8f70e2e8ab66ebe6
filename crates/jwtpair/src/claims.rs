//! Token claims
//!
//! Claims are an open, ordered map. The four registered claims the issuer controls (`iss`,
//! `aud`, `iat`, `exp`) are always present on issued tokens and can never be supplied by the
//! caller. Everything else (`sub`, `role`, ...) is carried through untouched.

use crate::error::{ClaimError, Error, Result};
use miniserde::json::{self, Number, Object, Value};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Claims the issuer sets itself
pub const RESERVED_CLAIMS: [&str; 4] = ["iss", "aud", "iat", "exp"];

/// Claim set of a token
#[derive(Debug, Clone, Default)]
pub struct Claims {
    inner: Object,
}

impl Claims {
    /// Standard claims for a token issued at `issued_at` that lives `lifetime` seconds
    pub(crate) fn standard(
        issuer: &str,
        audience: &str,
        issued_at: i64,
        lifetime: u64,
    ) -> Result<Self> {
        let lifetime = i64::try_from(lifetime)
            .ok()
            .filter(|lifetime| *lifetime > 0)
            .ok_or_else(|| {
                Error::ConfigurationInvalid(format!("token lifetime {lifetime}s is out of range"))
            })?;
        let expiration = issued_at
            .checked_add(lifetime)
            .ok_or_else(|| Error::ConfigurationInvalid("token expiry overflows".into()))?;

        let mut inner = Object::new();
        inner.insert("iat".into(), integer(issued_at));
        inner.insert("exp".into(), integer(expiration));
        inner.insert("iss".into(), Value::String(issuer.into()));
        inner.insert("aud".into(), Value::String(audience.into()));
        Ok(Self { inner })
    }

    /// Merge caller-supplied claims
    ///
    /// # Errors
    /// `ReservedClaim` if `additional` names one of [`RESERVED_CLAIMS`].
    pub fn extend(&mut self, additional: Object) -> Result<()> {
        if let Some(reserved) = additional
            .keys()
            .find(|name| RESERVED_CLAIMS.contains(&name.as_str()))
        {
            return Err(Error::ReservedClaim(reserved.clone()));
        }
        for (name, value) in additional.iter() {
            self.inner.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    pub(crate) fn from_json(input: &str) -> Result<Self> {
        let inner: Object = json::from_str(input)
            .map_err(|e| Error::MalformedToken(format!("Failed to parse payload: {e}")))?;
        Ok(Self { inner })
    }

    /// Serialize with sorted keys
    pub fn to_json(&self) -> String {
        json::to_string(&self.inner)
    }

    /// Raw claim value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.inner.get(name)
    }

    /// Claim value if it is a string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.inner.get(name) {
            Some(Value::String(value)) => Some(value),
            _ => None,
        }
    }

    /// Claim value if it is an integer
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.inner.get(name) {
            Some(Value::Number(Number::I64(value))) => Some(*value),
            Some(Value::Number(Number::U64(value))) => i64::try_from(*value).ok(),
            Some(Value::Number(Number::F64(value))) if value.fract() == 0.0 => {
                Some(*value as i64)
            }
            _ => None,
        }
    }

    pub fn issuer(&self) -> Option<&str> {
        self.get_str("iss")
    }

    pub fn subject(&self) -> Option<&str> {
        self.get_str("sub")
    }

    /// Audiences, either the single `aud` string or every string in an `aud` array
    pub fn audiences(&self) -> Vec<&str> {
        match self.inner.get("aud") {
            Some(Value::String(aud)) => vec![aud.as_str()],
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|value| match value {
                    Value::String(aud) => Some(aud.as_str()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn expiration(&self) -> Option<i64> {
        self.get_i64("exp")
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.get_i64("iat")
    }

    /// Application role of the subject
    pub fn role(&self) -> Option<&str> {
        self.get_str("role")
    }

    pub fn as_object(&self) -> &Object {
        &self.inner
    }

    pub fn into_object(self) -> Object {
        self.inner
    }
}

/// Current Unix time in seconds, with sub-second precision
pub(crate) fn current_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs_f64()
}

fn integer(value: i64) -> Value {
    match u64::try_from(value) {
        Ok(value) => Value::Number(Number::U64(value)),
        Err(_) => Value::Number(Number::I64(value)),
    }
}

/// Expected values for the registered claims
#[derive(Debug, Clone)]
pub struct ClaimsValidation {
    issuer: String,
    audience: String,
}

impl ClaimsValidation {
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    /// Check `iss`, `aud` and `exp` against `now` (seconds since epoch)
    pub(crate) fn validate(&self, claims: &Claims, now: i64) -> Result<()> {
        if claims.issuer() != Some(self.issuer.as_str()) {
            return Err(ClaimError::IssuerMismatch {
                expected: self.issuer.clone(),
                found: claims.issuer().map(ToString::to_string),
            }
            .into());
        }

        let audiences = claims.audiences();
        if !audiences.contains(&self.audience.as_str()) {
            return Err(ClaimError::AudienceMismatch {
                expected: self.audience.clone(),
                found: (!audiences.is_empty()).then(|| audiences.join(",")),
            }
            .into());
        }

        let expired_at = claims
            .expiration()
            .ok_or_else(|| ClaimError::Missing("exp".into()))?;
        if expired_at <= now {
            return Err(ClaimError::Expired { expired_at, now }.into());
        }

        Ok(())
    }
}
