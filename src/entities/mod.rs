pub mod access_logs;
pub mod cards;
pub mod chat_messages;
pub mod forgot_card_tokens;
pub mod password_reset_tokens;
pub mod payments;
pub mod plans;
pub mod points_transactions;
pub mod rewards;
pub mod subscriptions;
pub mod users;

pub use access_logs as access_log_entity;
pub use cards as card_entity;
pub use chat_messages as chat_message_entity;
pub use forgot_card_tokens as forgot_card_token_entity;
pub use password_reset_tokens as password_reset_token_entity;
pub use payments as payment_entity;
pub use plans as plan_entity;
pub use points_transactions as points_transaction_entity;
pub use rewards as reward_entity;
pub use subscriptions as subscription_entity;
pub use users as user_entity;
