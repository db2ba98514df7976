//! Database layer (Firestore).

pub mod firestore;
pub mod provider;

pub use firestore::FirestoreDb;
pub use provider::{Connect, DatabaseProvider, FirestoreConnector};

/// Collection names as constants.
pub mod collections {
    /// Dashboard accounts (keyed by username)
    pub const USERS: &str = "users";
    /// Readings pushed by the IoT gateways
    pub const IOT_GATEWAY_READINGS: &str = "iot_gateway_reading";
}
