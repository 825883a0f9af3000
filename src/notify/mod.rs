//! Outbound user notifications.
//!
//! Handlers call a [`Notifier`] directly with the activity, a rendered context and the recipients.
//! Delivery transports (mail, push) plug in behind the trait.

use std::collections::BTreeMap;

use crate::errors::AppError;

/// Something that happened which a user should hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    UserResetsPassword,
}

impl Activity {
    pub fn subject(&self) -> &'static str {
        match self {
            Activity::UserResetsPassword => "Password reset requested",
        }
    }
}

/// Template variables for a notification, e.g. `reset_password_url`.
pub type Context = BTreeMap<String, String>;

pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        activity: Activity,
        context: &Context,
        recipients: &[String],
    ) -> Result<(), AppError>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(
        &self,
        activity: Activity,
        context: &Context,
        recipients: &[String],
    ) -> Result<(), AppError> {
        if recipients.is_empty() {
            tracing::warn!("Notification {:?} has no recipients", activity);
            return Ok(());
        }

        tracing::info!(
            activity = ?activity,
            recipients = ?recipients,
            context = ?context,
            "{}",
            activity.subject()
        );
        Ok(())
    }
}

#[cfg(test)]
pub use recording::{Notification, RecordingNotifier};
