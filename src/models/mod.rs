//! Managed Resources
//!
//! Data structures matching backend entities, each with its schema table
//! and fallback fixtures.

mod course_module;
mod degree;
mod student;

pub use course_module::CourseModule;
pub use degree::Degree;
pub use student::Student;
