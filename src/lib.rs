//! Periodically fetches a cryptocurrency price and republishes it into a
//! Telegram chat by editing a pinned message and the chat description.

mod app;
mod args;
pub mod config;
pub mod format;
pub mod pipeline;
pub mod price;
pub mod publish;
pub mod responder;
pub mod scheduler;
pub mod telegram;
mod utils;

pub use app::Application;
