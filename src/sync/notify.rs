use tracing::info;

use crate::model::User;

/// Passed through to the dispatcher; the engine itself never sleeps or retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyHints {
    pub dry_run: bool,
    /// More than one user in the batch: pace sends for the mail provider.
    pub space_out: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Account messaging collaborator (email delivery lives behind this).
pub trait Notifier: Send + Sync {
    /// A new account exists. `plaintext` is set when the password was generated by the sync.
    fn account_created(&self, user: &User, plaintext: Option<&str>, hints: NotifyHints) -> Result<(), NotifyError>;

    /// An existing account received a freshly generated password.
    fn password_reset(&self, user: &User, plaintext: &str, hints: NotifyHints) -> Result<(), NotifyError>;
}

/// Emits one tracing event per message. Passwords are never written to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn account_created(&self, user: &User, plaintext: Option<&str>, hints: NotifyHints) -> Result<(), NotifyError> {
        info!(
            target: "coursegate::notify",
            "account created: email={} role={} generated_password={} dry_run={} space_out={}",
            user.email, user.role, plaintext.is_some(), hints.dry_run, hints.space_out
        );
        Ok(())
    }

    fn password_reset(&self, user: &User, _plaintext: &str, hints: NotifyHints) -> Result<(), NotifyError> {
        info!(
            target: "coursegate::notify",
            "password reset: email={} dry_run={} space_out={}",
            user.email, hints.dry_run, hints.space_out
        );
        Ok(())
    }
}
