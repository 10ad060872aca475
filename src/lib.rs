// Library for tests to access modules

pub mod aggregate;
pub mod client;
pub mod config;
pub mod discovery;
pub mod format;
pub mod models;
pub mod poller;
pub mod prefs;
pub mod routes;
pub mod scheduler;
pub mod version;
pub mod view;
