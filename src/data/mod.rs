//! Enedis customer-portal access: session login and raw curve retrieval.

pub mod enedis;
pub mod session;

pub use enedis::{DATA_URL, EnedisClient};
pub use session::{LOGIN_URL, build_client, login};
