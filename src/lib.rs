pub mod application;
pub mod cli;
pub mod domain;
pub mod storage;
pub mod view;

pub use domain::*;
pub use storage::SessionStore;
