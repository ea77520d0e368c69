pub mod blog;
pub mod category;
pub mod error;
