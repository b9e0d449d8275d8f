/// 安全模块
///
/// 目前只有一条规则：新成员转发消息检测。
///
/// ## 观察模式
///
/// 与 `watch_only` 配合：观察模式下仍然判定和计数，但不对外发送警告，
/// 适合上线初期先观察误判率。
pub mod spam_classifier;

pub use spam_classifier::{EmptyTextPolicy, SpamClassifier};
