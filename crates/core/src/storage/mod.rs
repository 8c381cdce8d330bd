pub mod manager;
pub mod memory;
pub mod repository;
