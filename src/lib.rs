//! Exam Prep Server
//!
//! This library provides the core functionality for the exam-prep-server
//! system: a local web server that lists classes stored on disk, serves quiz
//! and study-guide documents, accepts submitted answers and grades them
//! asynchronously by running an external grading script per submission.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
