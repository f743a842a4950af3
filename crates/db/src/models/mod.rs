pub mod ai_parsing_log;
pub mod analytics;
pub mod customer;
pub mod daily_profit;
pub mod dashboard;
pub mod parsed_sale;
pub mod sale;
pub mod strain;
