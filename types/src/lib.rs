mod complaint;
mod error;
mod identity;

pub use complaint::{Complaint, Priority, Status, UserCount};
pub use error::{Error, Result};
pub use identity::{Credentials, Identity, Role};

#[doc(hidden)]
pub use anyhow::anyhow as internal_anyhow_dont_use;
