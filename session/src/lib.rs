mod state;
mod store;

pub use state::SessionState;
pub use store::{LoginFailure, LogoutPolicy, SessionStore};
