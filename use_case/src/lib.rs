pub mod postal_code;

use std::sync::Arc;

use time::OffsetDateTime;

/// 現在日時を返す関数
///
/// テストで日時を固定できるように、ユースケースに注入する。
pub type Clock = Arc<dyn Fn() -> OffsetDateTime + Send + Sync>;

/// システム時計を返す。
pub fn system_clock() -> Clock {
    Arc::new(OffsetDateTime::now_utc)
}
