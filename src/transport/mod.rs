//! 传输层：入站 Update 来源与出站警告
//!
//! 核心逻辑只依赖 [`UpdateSource`] / [`WarningSender`] 两个 trait，
//! 具体实现目前只有 Telegram Bot API。

pub mod provider_trait;
pub mod telegram;

pub use provider_trait::{UpdateSource, WarningSender};
pub use telegram::{BotUser, TelegramClient};
