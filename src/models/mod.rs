pub mod fcm;
pub mod message;
pub mod retry;
pub mod status;
pub mod template;
pub mod user;
