pub mod types;
pub mod book;
pub mod valuation;
pub mod history;
