use crate::error::SecurityError;
use crate::request::OpenApiRequest;
use http::header::AUTHORIZATION;

/// Where a security scheme expects its credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// `Authorization: <scheme> <credentials>`, scheme compared case-insensitively
    Authorization(String),
    ApiKeyHeader(String),
    ApiKeyQuery(String),
    ApiKeyCookie(String),
}

impl Credential {
    fn is_present(&self, request: &dyn OpenApiRequest) -> bool {
        match self {
            Self::Authorization(scheme) => request
                .headers()
                .get_all(AUTHORIZATION)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .any(|value| {
                    let mut parts = value.trim().splitn(2, char::is_whitespace);
                    let given = parts.next().unwrap_or_default();
                    let credentials = parts.next().unwrap_or_default().trim();
                    given.eq_ignore_ascii_case(scheme) && !credentials.is_empty()
                }),
            Self::ApiKeyHeader(name) => request.headers().contains_key(name.as_str()),
            Self::ApiKeyQuery(name) => request.query().contains_key(name),
            Self::ApiKeyCookie(name) => request
                .cookies()
                .map(|cookies| cookies.contains_key(name))
                .unwrap_or(false),
        }
    }
}

/// One named scheme of a security requirement.
#[derive(Debug, Clone)]
pub struct SchemeCheck {
    pub name: String,
    pub credential: Credential,
}

/// Alternatives of an operation's `security`; one must be fully satisfied.
#[derive(Debug, Clone, Default)]
pub struct SecurityValidator {
    alternatives: Vec<Vec<SchemeCheck>>,
}

impl SecurityValidator {
    pub fn new(alternatives: Vec<Vec<SchemeCheck>>) -> Self {
        Self { alternatives }
    }

    pub fn validate(&self, request: &dyn OpenApiRequest) -> Result<(), SecurityError> {
        if self.alternatives.is_empty() {
            return Ok(());
        }

        let satisfied = self
            .alternatives
            .iter()
            .any(|checks| checks.iter().all(|check| check.credential.is_present(request)));
        if satisfied {
            return Ok(());
        }

        let mut schemes: Vec<String> = Vec::new();
        for check in self.alternatives.iter().flatten() {
            if !schemes.contains(&check.name) {
                schemes.push(check.name.clone());
            }
        }
        Err(SecurityError::Unsatisfied { schemes })
    }
}
