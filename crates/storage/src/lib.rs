#![forbid(unsafe_code)]

pub mod fixtures;
pub mod repository;
