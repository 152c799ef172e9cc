// src/models/mod.rs

pub mod comment;
pub mod film;
pub mod pagination;
pub mod user;
