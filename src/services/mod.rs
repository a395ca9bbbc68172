pub mod grader;
pub mod registry;
pub mod repository;
pub mod submissions;
