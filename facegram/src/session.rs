use std::fmt;

/// An authenticated session: created by a successful login, consumed by logout.
///
/// Passed explicitly to every authenticated call. The token is held in memory
/// only.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    username: String,
    token: String,
}

impl Session {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// True when `username` names the logged-in user.
    pub fn owns(&self, username: &str) -> bool {
        self.username == username
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}
