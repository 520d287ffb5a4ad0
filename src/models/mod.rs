// src/models/mod.rs

pub mod exam;
pub mod exam_record;
pub mod node;
pub mod user;
