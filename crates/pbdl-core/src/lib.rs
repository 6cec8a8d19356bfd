pub mod config;
pub mod logging;

pub mod browser;
pub mod discover;
pub mod fetcher;
pub mod harvest;
pub mod session;
pub mod storage;
pub mod url_model;
