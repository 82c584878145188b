use crate::domain_model::SessionId;
use std::fmt;

/// Composite key of a live refresh session: `<principal>:<session id>`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SessionKey {
    pub principal: String,
    pub session_id: SessionId,
}

impl SessionKey {
    pub fn new(principal: impl Into<String>, session_id: SessionId) -> Self {
        SessionKey {
            principal: principal.into(),
            session_id,
        }
    }

    /// Redis glob pattern matching exactly the sessions of `principal`.
    /// Glob metacharacters inside the principal are escaped, and the tail
    /// must have the shape of a hyphenated session id, so `a@x.com` never
    /// matches the keys of `a@x.com:other`.
    pub fn principal_pattern(principal: &str) -> String {
        let mut pattern = String::with_capacity(principal.len() + 1 + SESSION_ID_GLOB.len());
        for c in principal.chars() {
            if matches!(c, '*' | '?' | '[' | ']' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push(':');
        pattern.push_str(SESSION_ID_GLOB);
        pattern
    }

    /// The session id of `key` when it belongs to `principal`.
    pub fn session_id_in(principal: &str, key: &str) -> Option<SessionId> {
        let rest = key.strip_prefix(principal)?.strip_prefix(':')?;
        let session_id = rest.parse::<SessionId>().ok()?;
        // uuid also parses braced and urn forms; only the canonical one is ours.
        (session_id.to_string() == rest).then_some(session_id)
    }
}

const SESSION_ID_GLOB: &str = "????????-????-????-????-????????????";

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.principal, self.session_id)
    }
}
