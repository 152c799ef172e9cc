// src/services/mod.rs

pub mod discussion;
pub mod thread;

pub use discussion::DiscussionService;
