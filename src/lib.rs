pub mod application;
pub mod catalog;
pub mod commands;
pub mod domain;
pub mod error;
pub mod http;
pub mod pull;
pub mod runtime;
pub mod source;
