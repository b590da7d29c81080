pub mod dashboard;
pub mod format;
pub mod surface;
pub mod table;
pub mod terminal;
