//! Verification gateway implementations.

pub(crate) mod traits;

#[cfg(feature = "vonage")]
pub mod vonage;

pub use traits::VerificationSender;
