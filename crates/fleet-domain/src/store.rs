use serde::{Deserialize, Serialize};

/// A store registered with the fleet. Rows are inserted by admin tooling;
/// the only fields a running service ever mutates are the token-validity flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub store_id: i64,
    pub store_name: String,
    pub api_token: String,
    pub token_is_valid: bool,
    pub secret_key: String,
    pub table_id: String,
}
