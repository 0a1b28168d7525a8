pub mod pipeline_service;
pub mod telegram_service;
