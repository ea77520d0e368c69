pub mod blog_repository;
pub mod category_repository;
pub mod memory_repository;
