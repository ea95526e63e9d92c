pub mod logging;
pub mod node_client;

pub use node_client::{global_client, NodeClient};
