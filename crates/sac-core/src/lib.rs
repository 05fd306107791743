//! Domain core for the Student Activity Center platform
//!
//! Submission & evaluation lifecycle, role scoping, registration, and
//! membership capacity rules. Everything here is plain logic over a
//! `sea_orm` connection; HTTP concerns live in `sac-api`.

pub mod error;
pub mod lifecycle;
pub mod marks;
pub mod membership;
pub mod registration;
pub mod scope;

pub use error::Error;
pub use scope::Scope;

pub type Result<T> = std::result::Result<T, Error>;
