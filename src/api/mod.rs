pub mod http;

pub use http::{ApiServer, AppState, BalanceResponse, ErrorResponse, StatusResponse};
