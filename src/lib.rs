pub mod bot;
pub mod cli;
pub mod config;
pub mod error;
pub mod infra;
pub mod logging;
pub mod model;
pub mod security; // 垃圾消息判定
pub mod transport; // Bot API 接入

pub use bot::AntispamBot;
pub use config::AntispamConfig;
pub use error::{AntispamError, Result};
pub use infra::{
    Clock, EventRouter, EventRouterConfig, Evictor, ManualClock, MembershipStore, RouteOutcome,
    SpamCounter, SystemClock,
};
pub use model::*;
pub use security::{EmptyTextPolicy, SpamClassifier};
pub use transport::{TelegramClient, UpdateSource, WarningSender};
