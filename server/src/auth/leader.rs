use coursedeck::domain::EmailAddress;

/// The single fixed identity holding the LEADER role, injected from
/// settings at startup. Never hardcode the identity in business logic;
/// compare through this type only.
#[derive(Debug, Clone)]
pub struct LeaderPrincipal(EmailAddress);

impl LeaderPrincipal {
    pub fn new(email: EmailAddress) -> Self {
        Self(email)
    }

    /// Constant-time identity comparison.
    pub fn matches(&self, email: &str) -> bool {
        use subtle::ConstantTimeEq;

        self.0.as_ref().as_bytes().ct_eq(email.as_bytes()).into()
    }
}
