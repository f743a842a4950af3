pub mod business_advisor;
pub mod database_validator;
pub mod language_model;
pub mod openrouter;
pub mod quick_sale;
pub mod sale_extractors;
pub mod sale_parser;
pub mod sale_recorder;
pub mod speech;

#[cfg(test)]
pub(crate) mod test_support;
