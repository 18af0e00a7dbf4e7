pub mod clock;
pub use clock::{Clock, ManualClock, SystemClock};

pub mod identity_service;
pub use identity_service::{IdentityError, IdentityService, ServiceResponse};

pub mod identity_service_impl;
pub use identity_service_impl::SeaOrmIdentityService;

pub mod notification;
pub use notification::{
    MemoryNotificationSender, Notification, NotificationError, NotificationSender,
};

pub mod otp;
pub use otp::{OtpError, OtpPolicy, OtpState};

pub mod password;
pub use password::{Credential, CredentialHasher};

pub mod token;
pub use token::{Claims, TokenError, TokenIssuer};

pub mod validation;
