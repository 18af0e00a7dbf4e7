//! Message bodies for identity notifications.
//!
//! Passwords are never placed in a message. Expiry instants are rendered in
//! the configured display offset; that offset plays no part in expiry checks.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use super::Notification;
use crate::config::NotificationConfig;
use crate::domain::Role;

#[derive(Debug, Clone)]
pub struct Templates {
    app_name: String,
    display_offset: FixedOffset,
}

impl Templates {
    #[must_use]
    pub fn new(app_name: &str, display_offset_minutes: i32) -> Self {
        let display_offset = display_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());

        Self {
            app_name: app_name.to_string(),
            display_offset,
        }
    }

    #[must_use]
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::new(&config.app_name, config.display_utc_offset_minutes)
    }

    fn display_time(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.display_offset)
            .format("%Y-%m-%d %H:%M:%S %:z")
            .to_string()
    }

    #[must_use]
    pub fn welcome(
        &self,
        email: &str,
        username: &str,
        role: Role,
        verification: Option<(&str, DateTime<Utc>)>,
    ) -> Notification {
        let app = &self.app_name;
        let role_name = role.as_str().to_lowercase();

        let mut body = format!(
            "Dear {username},\n\nCongratulations! You have been registered as {article} {role_name} in {app}.\n\nYour username: {username}\n",
            article = if role == Role::Employee { "an" } else { "a" },
        );

        if let Some((code, expires_at)) = verification {
            body.push_str(&format!(
                "\nTo verify your email address use this code: {code}\nIt expires at {}.\n",
                self.display_time(expires_at)
            ));
        }

        body.push_str(&format!(
            "\nPlease keep your credentials confidential.\n\nThank you and welcome to {app}!"
        ));

        Notification::to(
            email,
            format!("Welcome to {app} - {} Registration", role.as_str()),
            body,
        )
    }

    #[must_use]
    pub fn password_reset(&self, email: &str, code: &str, expires_at: DateTime<Utc>) -> Notification {
        let app = &self.app_name;
        Notification::to(
            email,
            format!("{app} - Password Reset OTP"),
            format!(
                "Dear {email},\n\nYou have requested a password reset for your {app} account.\n\nYour OTP (One-Time Password) is: {code}\n\nIt expires at {}.\n\nIf you did not request this password reset, please ignore this message.\n\nThank you!",
                self.display_time(expires_at)
            ),
        )
    }

    #[must_use]
    pub fn otp_resent(&self, email: &str, code: &str, expires_at: DateTime<Utc>) -> Notification {
        Notification::to(
            email,
            format!("{} - OTP Resent", self.app_name),
            format!(
                "This is your new OTP: {code}.\n\nIt will expire at {}.",
                self.display_time(expires_at)
            ),
        )
    }

    #[must_use]
    pub fn manager_appointed(&self, email: &str, username: &str) -> Notification {
        let app = &self.app_name;
        Notification::to(
            email,
            format!("Welcome to {app} - Manager Appointment"),
            format!(
                "Dear {username},\n\nCongratulations! You have been appointed as a manager in {app}.\n\nYour username: {username}\nYour password has been set by your administrator.\n\nPlease keep your credentials confidential.\n\nThank you and welcome to {app}!"
            ),
        )
    }
}
