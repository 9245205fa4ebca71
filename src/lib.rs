pub mod browser;
pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod process;
pub mod publish;
