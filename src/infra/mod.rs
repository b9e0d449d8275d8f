// Infrastructure layer - 基础设施层
// 负责成员表、垃圾计数、后台清理、事件路由与监控指标

pub mod clock;
pub mod event_router;
pub mod evictor;
pub mod membership_store;
pub mod metrics;
pub mod spam_counter;

// 重新导出主要类型
pub use clock::{Clock, ManualClock, SystemClock};
pub use event_router::{EventRouter, EventRouterConfig, RouteOutcome, DEFAULT_WARNING_TEXT};
pub use evictor::Evictor;
pub use membership_store::MembershipStore;
pub use spam_counter::SpamCounter;
