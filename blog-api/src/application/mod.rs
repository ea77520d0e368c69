pub mod admin;
pub mod blog_service;
pub mod category_service;
