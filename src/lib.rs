pub mod config;
pub mod history;
pub mod output;
pub mod scan;
pub mod scoring;
pub mod sites;
