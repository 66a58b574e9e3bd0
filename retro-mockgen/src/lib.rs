pub mod alerts;
pub mod daily;

pub use alerts::{generate_alert, generate_alerts, uuid_from, AlertOptions, ALERT_TITLES};
pub use daily::{
    generate_daily_item, generate_daily_summary, generate_tag_retrospective, DailyItem,
    DailySummary, TagRetrospective, MOCK_TAGS,
};
