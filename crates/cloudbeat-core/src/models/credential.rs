use std::fmt;

/// How a call to the data platform authenticates.
///
/// `Caller` forwards the end user's bearer token so row-level security is evaluated
/// for that user. `Service` uses the gateway's own platform key and is reserved for
/// unauthenticated surfaces (playlists, operator tooling).
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Service,
    Caller { user_id: String, token: String },
}

impl Credential {
    pub fn caller(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Credential::Caller {
            user_id: user_id.into(),
            token: token.into(),
        }
    }

    /// Subject the credential acts for, if any.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Credential::Service => None,
            Credential::Caller { user_id, .. } => Some(user_id),
        }
    }

    /// Bearer value to send, falling back to the service key.
    pub fn bearer<'a>(&'a self, service_key: &'a str) -> &'a str {
        match self {
            Credential::Service => service_key,
            Credential::Caller { token, .. } => token,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Service => write!(f, "Service"),
            Credential::Caller { user_id, .. } => f
                .debug_struct("Caller")
                .field("user_id", user_id)
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}
