use std::fmt;

/// An opaque error shared across the workspace.
///
/// Any `std::error::Error` converts into it with `?`. When `RUST_BACKTRACE=1`
/// is set, the `Debug` output includes the full backtrace.
pub struct Error(anyhow::Error);

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    #[doc(hidden)]
    pub fn from_anyhow(report: anyhow::Error) -> Self {
        Self(report)
    }

    /// Wrap the error with a higher-level message.
    pub fn context<C>(self, context: C) -> Self
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        Self(self.0.context(context))
    }

    /// Messages from the outermost context down to the root cause.
    pub fn chain(&self) -> Vec<String> {
        self.0.chain().map(ToString::to_string).collect()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<E> From<E> for Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self(anyhow::Error::new(error))
    }
}

/// Build an [`Error`](crate::Error) from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_anyhow($crate::internal_anyhow_dont_use!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_outermost_in_chain() {
        let error: Error = std::io::Error::other("disk full").into();
        let error = error.context("failed to write export");

        assert_eq!(error.to_string(), "failed to write export");
        assert_eq!(error.chain(), vec!["failed to write export", "disk full"]);
    }

    #[test]
    fn err_macro_formats() {
        let error = crate::err!("unknown role: {}", "owner");
        assert_eq!(error.to_string(), "unknown role: owner");
    }
}
