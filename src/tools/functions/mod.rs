//! Tool function implementations organized by functionality

pub mod merge_request;
pub mod pipeline;
pub mod repository;
pub mod search;
