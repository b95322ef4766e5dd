// Library for tests to access modules

pub mod analyzer;
pub mod collector;
pub mod config;
pub mod models;
pub mod report;
pub mod runner;
pub mod store;
