pub mod admin;
pub mod cron;
pub mod draw;
pub mod ops;
pub mod reward;

pub use admin::admin_config;
pub use cron::cron_config;
pub use draw::draw_config;
pub use ops::ops_config;
pub use reward::reward_config;
