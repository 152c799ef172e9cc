// src/handlers/mod.rs

pub mod discussion;
