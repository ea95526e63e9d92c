//! Domain 模块
//!
//! 密钥/地址编解码、memo 信封、Graphene 链上对象与规范化账目模型

pub mod binary;
pub mod chain;
pub mod checksum;
pub mod keys;
pub mod ledger;
pub mod memo;
pub mod object_id;
pub mod operation;
pub mod signing;

// 重新导出常用类型
pub use chain::{Account, Asset, Block, BroadcastResult, DynamicGlobalProperties, OperationHistory};
pub use keys::{PrivateKey, PublicKey, ADDRESS_PREFIX};
pub use ledger::{AssetBalance, LedgerEntry, Utxo};
pub use memo::{MemoCipher, MemoEnvelope, MemoReader};
pub use object_id::{ObjectId, HISTORY_SENTINEL};
pub use operation::{AssetAmount, Operation, SignedTransaction, Transaction, TransferOperation};
