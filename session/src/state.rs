use types::Identity;

/// A point-in-time view of who is signed in.
///
/// The admin flag is derived from the identity's role, so it can never be set
/// while no identity is held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    identity: Option<Identity>,
    loading: bool,
}

impl SessionState {
    /// The state a store starts in: nobody signed in, session check pending.
    pub fn initial() -> Self {
        Self {
            identity: None,
            loading: true,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.identity.as_ref().is_some_and(Identity::is_admin)
    }

    /// True while a session check is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub(crate) fn set_identity(&mut self, identity: Option<Identity>) {
        self.identity = identity;
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}
