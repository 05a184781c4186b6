pub mod bonus_drops;
pub mod draws;
pub mod ops_config;
pub mod rewards;
pub mod tickets;

pub use bonus_drops as bonus_drop_entity;
pub use draws as draw_entity;
pub use ops_config as ops_config_entity;
pub use rewards as reward_entity;
pub use tickets as ticket_entity;

pub use bonus_drops::BonusDropStatus;
pub use draws::DrawStatus;
pub use ops_config::OpsMode;
pub use rewards::RewardKind;
pub use tickets::TicketStatus;
