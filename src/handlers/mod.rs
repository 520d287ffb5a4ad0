// src/handlers/mod.rs

pub mod exam;
pub mod mindmap;
