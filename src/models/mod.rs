pub mod auth;
pub mod chat;
pub mod common;
pub mod forgot_card;
pub mod history;
pub mod member;
pub mod pagination;
pub mod password_reset;
pub mod payment;
pub mod renewal;
pub mod reward;

pub use auth::*;
pub use chat::*;
pub use common::*;
pub use forgot_card::*;
pub use history::*;
pub use member::*;
pub use pagination::*;
pub use password_reset::*;
pub use payment::*;
pub use renewal::*;
pub use reward::*;
