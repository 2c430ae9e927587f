pub mod daily_limit;
pub mod handlers;
