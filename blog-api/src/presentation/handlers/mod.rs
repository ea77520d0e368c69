pub mod admin;
pub mod blog;
pub mod category;
pub mod root;
