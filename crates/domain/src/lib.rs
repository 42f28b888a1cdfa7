#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod catalog;

mod activity;
mod email;
mod error;
mod exercise;
mod name;
mod outcome;
mod password;
mod routine;
mod service;
mod statistics;
mod subscription;
mod user;

pub use activity::*;
pub use email::*;
pub use error::*;
pub use exercise::*;
pub use name::*;
pub use outcome::*;
pub use password::*;
pub use routine::*;
pub use service::*;
pub use statistics::*;
pub use subscription::*;
pub use user::*;
