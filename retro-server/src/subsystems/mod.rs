pub mod alerts;
pub mod daily;
pub mod insights;
