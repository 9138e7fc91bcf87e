pub mod email;
pub mod twilio;
pub mod vnpay;

pub use email::EmailService;
pub use twilio::TwilioService;
pub use vnpay::{PaymentUrlRequest, VnpayService};
