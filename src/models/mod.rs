pub mod address;
pub mod block;
pub mod notification;
pub mod units;

pub use address::{normalize_address, to_checksum, validate_address};
pub use block::{parse_hex_u128, parse_hex_u64, Block, Transaction};
pub use notification::NotificationEvent;
pub use units::from_wei;
