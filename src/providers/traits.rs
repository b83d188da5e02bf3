//! Sender trait definition.

use crate::types::{Destination, VerificationCode};
use std::future::Future;

/// Core trait that all verification gateways implement.
///
/// One asynchronous operation per channel. Both resolve to a plain
/// delivery outcome: `true` when the gateway accepted the message, `false`
/// for every kind of failure. Failures are absorbed by the implementation
/// (logged and counted), so callers never need gateway-specific error
/// handling.
///
/// # Note on async methods
///
/// All async methods in this trait return `Send` futures, making them
/// compatible with multi-threaded executors.
///
/// # Example
///
/// ```rust,ignore
/// use verify_senders::{Destination, VerificationCode, VerificationSender};
///
/// async fn send_code<S: VerificationSender>(sender: &S, to: &str, code: &str) -> bool {
///     let destination = Destination::from(to);
///     let code = VerificationCode::from(code);
///     if sender.deliver_sms(&destination, Some("ios"), &code).await {
///         return true;
///     }
///     // Fall back to a voice call
///     sender.deliver_voice(&destination, &code, None).await
/// }
/// ```
pub trait VerificationSender: Send + Sync {
    /// Name of the gateway, used in logs and metrics.
    fn name(&self) -> &str;

    /// Deliver a code by text message.
    ///
    /// # Arguments
    /// * `destination` - Phone number to deliver to
    /// * `client_type` - Optional hint selecting the message template (`"ios"`, `"android-ng"`)
    /// * `code` - The verification code
    fn deliver_sms(
        &self,
        destination: &Destination,
        client_type: Option<&str>,
        code: &VerificationCode,
    ) -> impl Future<Output = bool> + Send;

    /// Deliver a code by voice call.
    ///
    /// # Arguments
    /// * `destination` - Phone number to call
    /// * `code` - The verification code
    /// * `locale` - Optional language for the spoken prompt (e.g., `"en-US"`)
    fn deliver_voice(
        &self,
        destination: &Destination,
        code: &VerificationCode,
        locale: Option<&str>,
    ) -> impl Future<Output = bool> + Send;
}
