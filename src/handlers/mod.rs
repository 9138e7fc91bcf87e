pub mod auth;
pub mod member;
pub mod history;
pub mod renewal;
pub mod payment;
pub mod rewards;
pub mod forgot_card;
pub mod password_reset;
pub mod chat;
pub mod health;

pub use auth::auth_config;
pub use member::member_config;
pub use history::history_config;
pub use renewal::renewal_config;
pub use payment::payment_config;
pub use rewards::rewards_config;
pub use forgot_card::forgot_card_config;
pub use password_reset::password_reset_config;
pub use chat::{chat_config, ws_config};
pub use health::health_config;
