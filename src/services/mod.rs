pub mod auth_service;
pub mod member_service;
pub mod history_service;
pub mod renewal_service;
pub mod payment_service;
pub mod reward_service;
pub mod chat_service;
pub mod presence;
pub mod forgot_card_service;
pub mod password_reset_service;

pub use auth_service::*;
pub use member_service::*;
pub use history_service::*;
pub use renewal_service::*;
pub use payment_service::*;
pub use reward_service::*;
pub use chat_service::*;
pub use presence::*;
pub use forgot_card_service::*;
pub use password_reset_service::*;
