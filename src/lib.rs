pub mod background;
pub mod common;
pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod storage;
