pub mod admin_service;
pub mod auth_service;
pub mod bonus_drop_service;
pub mod draw_service;
pub mod ops_service;
pub mod orchestration_service;
pub mod panic_service;
pub mod reward_service;
pub mod selection_service;

pub use admin_service::*;
pub use auth_service::*;
pub use bonus_drop_service::*;
pub use draw_service::*;
pub use ops_service::*;
pub use orchestration_service::*;
pub use panic_service::*;
pub use reward_service::*;
pub use selection_service::*;
