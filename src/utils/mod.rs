pub mod code_generator;
pub mod day_bucket;
pub mod jwt;
pub mod password;
pub mod wallet;

pub use code_generator::generate_ticket_code;
pub use day_bucket::{DayBucketer, DrawWindow};
pub use jwt::*;
pub use password::*;
pub use wallet::*;
