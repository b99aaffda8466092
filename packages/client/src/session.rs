//! Login and registration gate in front of the map.

use crate::api::{Backend, ClientError};

/// Shown after a successful registration.
pub const REGISTRATION_SUCCESS: &str = "Registration successful!";

/// Shown when the server refuses a registration.
pub const REGISTRATION_TAKEN: &str = "Registration unsuccessful, username already in use.";

/// Shown when a registration fails for any other reason.
pub const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";

/// Shown when a login fails for any reason.
pub const LOGIN_FAILED: &str = "Login failed. Please try again.";

/// Whether the user has passed the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// The login and registration forms are shown.
    #[default]
    LoggedOut,
    /// The map is shown.
    LoggedIn {
        /// Who logged in.
        username: String,
    },
}

/// A username/password form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialsForm {
    /// Username input.
    pub username: String,
    /// Password input.
    pub password: String,
}

impl CredentialsForm {
    /// Fills both inputs.
    #[must_use]
    pub fn with(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Empties the form, returning what was typed.
    fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

/// Session state plus the two forms and the message shown under them.
///
/// Both forms are emptied by every submission whatever its outcome. The
/// session is held in memory only.
#[derive(Debug, Default)]
pub struct SessionGate {
    state: SessionState,
    /// The login form.
    pub login_form: CredentialsForm,
    /// The registration form.
    pub register_form: CredentialsForm,
    message: Option<String>,
}

impl SessionGate {
    /// A logged-out gate with empty forms.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether the map should be shown.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self.state, SessionState::LoggedIn { .. })
    }

    /// The message shown under the forms, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Submits the login form.
    ///
    /// Returns whether the user is now logged in.
    pub async fn submit_login(&mut self, backend: &dyn Backend) -> bool {
        let form = self.login_form.take();

        match backend.login(&form.username, &form.password).await {
            Ok(_) => {
                log::info!("Logged in as {}", form.username);
                self.state = SessionState::LoggedIn {
                    username: form.username,
                };
                self.message = None;
                true
            }
            Err(e) => {
                log::warn!("Login failed for {}: {e}", form.username);
                self.message = Some(LOGIN_FAILED.to_string());
                false
            }
        }
    }

    /// Submits the registration form. Registering does not log in.
    ///
    /// Returns whether the account was created.
    pub async fn submit_register(&mut self, backend: &dyn Backend) -> bool {
        let form = self.register_form.take();

        let (created, message) = match backend.register(&form.username, &form.password).await {
            Ok(_) => (true, REGISTRATION_SUCCESS),
            Err(ClientError::Rejected { message }) => {
                log::warn!("Registration refused for {}: {message}", form.username);
                (false, REGISTRATION_TAKEN)
            }
            Err(e) => {
                log::error!("Registration failed for {}: {e}", form.username);
                (false, REGISTRATION_FAILED)
            }
        };

        self.message = Some(message.to_string());
        created
    }

    /// Returns to the forms.
    pub fn logout(&mut self) {
        self.state = SessionState::LoggedOut;
        self.message = None;
    }
}
