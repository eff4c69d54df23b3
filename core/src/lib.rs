pub mod calorie_import;
pub mod db;
pub mod error;
pub mod models;
pub mod render;
pub mod report;
