pub mod adapter;
pub mod history;
pub mod lookup_cache;
pub mod node_api;
pub mod normalizer;
pub mod transaction_builder;

pub use adapter::ExchangeAdapter;
pub use history::{next_cursor, HistoryPage, HistoryPaginator, MAX_HISTORY_LIMIT};
pub use node_api::{LookupError, LookupResult, NodeApi};
pub use normalizer::TransactionNormalizer;
pub use transaction_builder::{TransactionBuilder, TransferRequest};
