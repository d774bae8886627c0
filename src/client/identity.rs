//! Identity as handed over by the external identity provider.
use crate::domain::Principal;

/// The current principal plus the provider's readiness flag.
///
/// While `auth_loading` is true nothing ownership-sensitive may be rendered or
/// requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityContext {
    principal: Option<Principal>,
    auth_loading: bool,
}

impl IdentityContext {
    pub fn loading() -> Self {
        Self {
            principal: None,
            auth_loading: true,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            auth_loading: false,
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.auth_loading
    }
}
