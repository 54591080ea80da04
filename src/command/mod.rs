mod chat;
mod login;
mod models;
mod poll;

pub use chat::run_chat;
pub use login::run_login;
pub use models::run_models;
pub use poll::run_poll;
