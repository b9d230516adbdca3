#![allow(ambiguous_glob_reexports)]

pub mod initialize;
pub mod init_player;
pub mod get_player;
pub mod request_randomness;
pub mod consume_randomness;
pub mod heal;
pub mod abandon_request;
pub mod deposit;
pub mod withdraw;

pub use initialize::*;
pub use init_player::*;
pub use get_player::*;
pub use request_randomness::*;
pub use consume_randomness::*;
pub use heal::*;
pub use abandon_request::*;
pub use deposit::*;
pub use withdraw::*;
