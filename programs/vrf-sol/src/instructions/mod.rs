#![allow(ambiguous_glob_reexports)]

pub mod initialize;
pub mod update_config;
pub mod request;
pub mod fulfill;
pub mod cancel_request;
pub mod close_request;

pub use initialize::*;
pub use update_config::*;
pub use request::*;
pub use fulfill::*;
pub use cancel_request::*;
pub use close_request::*;
