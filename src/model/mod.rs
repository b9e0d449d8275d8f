//! 数据模型模块

// 领域事件（路由器消费）
pub mod event;

// 传输层 Update 结构（Bot API JSON）
pub mod update;

// 重新导出常用类型
pub use event::*;
pub use update::*;
