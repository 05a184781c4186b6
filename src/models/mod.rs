pub mod admin;
pub mod bonus_drop;
pub mod common;
pub mod cycle;
pub mod draw;
pub mod ops;
pub mod reward;

pub use admin::*;
pub use bonus_drop::*;
pub use common::*;
pub use cycle::*;
pub use draw::*;
pub use ops::*;
pub use reward::*;
