//! External service integrations.

pub mod services {
    pub use crate::services::*;
}

pub mod store_client {
    pub use crate::store_client::*;
}

pub mod record_storage {
    pub use crate::record_storage::*;
}
