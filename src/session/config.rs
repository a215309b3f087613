//! Credentials presented during the join handshake.

use std::fmt;

use crate::packet::AdminJoin;

/// Client name sent when none is configured.
pub const DEFAULT_CLIENT_NAME: &str = "adminport";

/// Client version sent when none is configured.
pub const DEFAULT_CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Password, client name and client version for the join request.
///
/// Every part is optional. Without a password the session does not
/// authenticate on connect; an empty name or version falls back to the
/// library defaults.
///
/// # Examples
///
/// ```
/// use adminport::session::{Credentials, DEFAULT_CLIENT_NAME};
///
/// let credentials = Credentials::new().password("secret");
/// assert_eq!(credentials.password_value(), Some("secret"));
/// assert_eq!(credentials.name_value(), DEFAULT_CLIENT_NAME);
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    password: Option<String>,
    name: Option<String>,
    version: Option<String>,
}

impl Credentials {
    /// Credentials with no password and default name and version.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Set the admin port password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the client name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the client version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// The configured password, or `None` if absent or empty.
    #[must_use]
    pub fn password_value(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// The client name that will be sent.
    #[must_use]
    pub fn name_value(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_CLIENT_NAME)
    }

    /// The client version that will be sent.
    #[must_use]
    pub fn version_value(&self) -> &str {
        self.version
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CLIENT_VERSION)
    }

    /// Build the join request, or `None` without a password.
    #[must_use]
    pub fn join_packet(&self) -> Option<AdminJoin> {
        self.password_value().map(|password| AdminJoin {
            password: password.to_owned(),
            name: self.name_value().to_owned(),
            version: self.version_value().to_owned(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("password", &self.password_value().map(|_| "<redacted>"))
            .field("name", &self.name_value())
            .field("version", &self.version_value())
            .finish()
    }
}
