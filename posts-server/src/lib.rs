//! A small community blog: users write posts, optionally file them under a
//! group, and browse them by author, by group or through the global feed.

pub mod application;
pub mod data;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod server;
