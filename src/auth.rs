/// Decides whether a username/password pair may open a session.
///
/// The shipped policy is a single hardcoded credential. It is a placeholder,
/// not an access-control design; swap the implementation on `AppState` to
/// change it.
pub trait CredentialPolicy: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

pub const DEFAULT_USERNAME: &str = "user";
pub const DEFAULT_PASSWORD: &str = "54321";

#[derive(Debug, Clone)]
pub struct FixedCredential {
    username: String,
    password: String,
}

impl FixedCredential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl Default for FixedCredential {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME, DEFAULT_PASSWORD)
    }
}

impl CredentialPolicy for FixedCredential {
    fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}
