//! 测试辅助模块
//! 内存版节点 + 固定链上数据，记录每个方法和每个ID的查询次数

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use gxc_adapter::{
    config::ChainConfig,
    domain::{
        chain::AccountOptions, Account, Asset, AssetAmount, Block, BroadcastResult,
        DynamicGlobalProperties, MemoEnvelope, ObjectId, Operation, OperationHistory, PublicKey,
        SignedTransaction, Transaction, TransferOperation,
    },
    service::{LookupError, LookupResult, NodeApi},
    utils::parse_chain_time,
};

pub const CHAIN_ID: &str = "4f7d07969c446f8342033acb3ab2ae5044cbe0fde93db02de75bd17fa8fd84b8";

pub const SENDER_ADDRESS: &str = "GXC58owosbFrudGVp8VCuMvDWpenx7AZSLwxEtAVqjWeqZ4YVLLWb";
pub const SENDER_PRIVATE_HEX: &str =
    "8bf481abeecbb3654e5f8581af0c8bd8d83df31fb2df8cac0440c100d84a3141";
pub const RECIPIENT_ADDRESS: &str = "GXC8AoHzhXhMRV9AFTihMAcQPNXKFEZCeYNYomdcc7vh8Gzp7b7xP";

/// 最新不可逆区块
pub const LIB: u64 = 1_000_000;
/// `block(LIB).previous` 第 4..8 字节 = aa bb cc dd
pub const LIB_PREVIOUS: &str = "000f423faabbccdd000000000000000000000000";
pub const CHAIN_TIME: &str = "2026-03-19T04:08:42";

pub const BLOCK_HEIGHT: u64 = 999_000;
pub const BLOCK_TX_IDS: [&str; 2] = [
    "aa00000000000000000000000000000000000001",
    "bb00000000000000000000000000000000000002",
];
pub const BLOCK_TIME: &str = "2026-03-19T04:00:00";

pub const KNOWN_TX_ID: &str = "cc00000000000000000000000000000000000003";

pub const TRANSFER_FEE: u64 = 1210;

pub fn gxc() -> Asset {
    Asset {
        id: ObjectId::asset(1),
        symbol: "GXC".into(),
        precision: 5,
    }
}

pub fn usdt() -> Asset {
    Asset {
        id: ObjectId::asset(2),
        symbol: "USDT".into(),
        precision: 6,
    }
}

pub fn account(instance: u64, name: &str, memo_key: &str) -> Account {
    Account {
        id: ObjectId::account(instance),
        name: name.into(),
        options: AccountOptions {
            memo_key: memo_key.into(),
        },
    }
}

pub fn hot_wallet() -> Account {
    account(4015, "exchange-hot", SENDER_ADDRESS)
}

pub fn light() -> Account {
    account(17, "gxb-light", RECIPIENT_ADDRESS)
}

pub fn cold_wallet() -> Account {
    account(22, "exchange-cold", SENDER_ADDRESS)
}

pub fn chain_config() -> ChainConfig {
    ChainConfig {
        core_asset: "GXC".into(),
        expiration_secs: 600,
    }
}

pub fn time(raw: &str) -> NaiveDateTime {
    parse_chain_time(raw).expect("valid chain time")
}

pub fn transfer(from: u64, to: u64, amount: u64, asset: u64) -> Operation {
    Operation::Transfer(TransferOperation {
        fee: AssetAmount::new(TRANSFER_FEE, ObjectId::asset(1)),
        from: ObjectId::account(from),
        to: ObjectId::account(to),
        amount: AssetAmount::new(amount, ObjectId::asset(asset)),
        memo: None,
        extensions: Vec::new(),
    })
}

pub fn transfer_with_memo(from: u64, to: u64, amount: u64, memo: MemoEnvelope) -> Operation {
    let mut op = transfer(from, to, amount, 1);
    if let Operation::Transfer(t) = &mut op {
        t.memo = Some(memo);
    }
    op
}

/// 非 transfer 操作（account_update）
pub fn other_op() -> Operation {
    Operation::Other {
        op_type: 6,
        body: serde_json::json!({
            "fee": {"amount": 100, "asset_id": "1.3.1"},
            "account": "1.2.17"
        }),
    }
}

pub fn transaction(operations: Vec<Operation>) -> Transaction {
    Transaction {
        ref_block_num: 23050,
        ref_block_prefix: 2_860_236_571,
        expiration: time("2026-03-19T04:18:42"),
        operations,
        extensions: Vec::new(),
    }
}

pub fn signed(operations: Vec<Operation>) -> SignedTransaction {
    SignedTransaction {
        transaction: transaction(operations),
        signatures: vec!["1f".repeat(65)],
    }
}

pub fn history_item(instance: u64, op: Operation, block_num: u64) -> OperationHistory {
    OperationHistory {
        id: ObjectId::operation_history(instance),
        op,
        block_num,
        trx_in_block: 1,
        op_in_trx: 0,
        virtual_op: instance * 10,
    }
}

/// 内存版 Graphene 节点
pub struct MockNode {
    pub assets: Vec<Asset>,
    pub accounts: Vec<Account>,
    pub key_refs: HashMap<PublicKey, Vec<ObjectId>>,
    pub balances: HashMap<ObjectId, Vec<AssetAmount>>,
    pub history: Vec<OperationHistory>,
    pub blocks: HashMap<u64, Block>,
    pub transactions: HashMap<String, SignedTransaction>,
    pub props: DynamicGlobalProperties,
    pub broadcast_result: BroadcastResult,
    /// 为 true 时所有账户查询以传输错误失败
    pub fail_accounts: bool,
    calls: Mutex<HashMap<&'static str, usize>>,
    id_lookups: Mutex<HashMap<ObjectId, usize>>,
    pub broadcasted: Mutex<Vec<SignedTransaction>>,
}

impl Default for MockNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNode {
    pub fn new() -> Self {
        let sender: PublicKey = SENDER_ADDRESS.parse().expect("valid address");

        let block = Block {
            previous: LIB_PREVIOUS.into(),
            timestamp: time(CHAIN_TIME),
            transactions: Vec::new(),
            transaction_ids: Vec::new(),
        };
        let busy_block = Block {
            previous: LIB_PREVIOUS.into(),
            timestamp: time(BLOCK_TIME),
            transactions: vec![
                SignedTransaction::unsigned(transaction(vec![transfer(4015, 17, 318_000, 1)])),
                SignedTransaction::unsigned(transaction(vec![
                    other_op(),
                    transfer(17, 22, 5_000_000, 2),
                ])),
            ],
            transaction_ids: BLOCK_TX_IDS.iter().map(|s| s.to_string()).collect(),
        };

        Self {
            assets: vec![gxc(), usdt()],
            accounts: vec![hot_wallet(), light(), cold_wallet()],
            key_refs: HashMap::from([(
                sender,
                vec![ObjectId::account(4015), ObjectId::account(22)],
            )]),
            balances: HashMap::from([(
                ObjectId::account(4015),
                vec![
                    AssetAmount::new(123_456_789, ObjectId::asset(1)),
                    AssetAmount::new(0, ObjectId::asset(2)),
                ],
            )]),
            history: Vec::new(),
            blocks: HashMap::from([(LIB, block), (BLOCK_HEIGHT, busy_block)]),
            transactions: HashMap::from([(
                KNOWN_TX_ID.to_string(),
                SignedTransaction::unsigned(transaction(vec![transfer(4015, 17, 100, 1)])),
            )]),
            props: DynamicGlobalProperties {
                head_block_number: LIB + 12,
                last_irreversible_block_num: LIB,
                time: time(CHAIN_TIME),
            },
            broadcast_result: BroadcastResult {
                id: KNOWN_TX_ID.into(),
                block_num: LIB + 13,
                trx_num: 3,
                expired: false,
            },
            fail_accounts: false,
            calls: Mutex::new(HashMap::new()),
            id_lookups: Mutex::new(HashMap::new()),
            broadcasted: Mutex::new(Vec::new()),
        }
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 某方法被调用的次数
    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    /// 某ID在批量查询中出现的次数
    pub fn lookups(&self, id: ObjectId) -> usize {
        self.id_lookups.lock().unwrap().get(&id).copied().unwrap_or(0)
    }

    fn record(&self, method: &'static str) {
        *self.calls.lock().unwrap().entry(method).or_default() += 1;
    }

    fn record_ids(&self, ids: &[ObjectId]) {
        let mut lookups = self.id_lookups.lock().unwrap();
        for id in ids {
            *lookups.entry(*id).or_default() += 1;
        }
    }

    fn find_account(&self, name_or_id: &str) -> Option<Account> {
        match name_or_id.parse::<ObjectId>() {
            Ok(id) => self.accounts.iter().find(|a| a.id == id).cloned(),
            Err(_) => self.accounts.iter().find(|a| a.name == name_or_id).cloned(),
        }
    }
}

#[async_trait]
impl NodeApi for MockNode {
    async fn get_chain_id(&self) -> LookupResult<String> {
        self.record("get_chain_id");
        Ok(CHAIN_ID.into())
    }

    async fn get_asset(&self, symbol_or_id: &str) -> LookupResult<Asset> {
        self.record("get_asset");
        let found = match symbol_or_id.parse::<ObjectId>() {
            Ok(id) => {
                self.record_ids(&[id]);
                self.assets.iter().find(|a| a.id == id)
            }
            Err(_) => self.assets.iter().find(|a| a.symbol == symbol_or_id),
        };
        found
            .cloned()
            .ok_or_else(|| LookupError::not_found("asset", symbol_or_id))
    }

    async fn get_assets(&self, ids: &[ObjectId]) -> LookupResult<Vec<Asset>> {
        self.record("get_assets");
        self.record_ids(ids);
        Ok(self
            .assets
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn get_account(&self, name_or_id: &str) -> LookupResult<Account> {
        self.record("get_account");
        if self.fail_accounts {
            return Err(LookupError::Transport("connection reset".into()));
        }
        self.find_account(name_or_id)
            .ok_or_else(|| LookupError::not_found("account", name_or_id))
    }

    async fn get_accounts_by_ids(&self, ids: &[ObjectId]) -> LookupResult<Vec<Account>> {
        self.record("get_accounts_by_ids");
        if self.fail_accounts {
            return Err(LookupError::Transport("connection reset".into()));
        }
        self.record_ids(ids);
        Ok(self
            .accounts
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn get_key_references(&self, key: &PublicKey) -> LookupResult<Vec<ObjectId>> {
        self.record("get_key_references");
        Ok(self.key_refs.get(key).cloned().unwrap_or_default())
    }

    async fn get_account_balances(
        &self,
        account: ObjectId,
        assets: &[ObjectId],
    ) -> LookupResult<Vec<AssetAmount>> {
        self.record("get_account_balances");
        let all = self.balances.get(&account).cloned().unwrap_or_default();
        if assets.is_empty() {
            return Ok(all);
        }
        Ok(assets
            .iter()
            .map(|id| {
                all.iter()
                    .find(|a| a.asset_id == *id)
                    .cloned()
                    .unwrap_or_else(|| AssetAmount::new(0, *id))
            })
            .collect())
    }

    async fn get_account_history(
        &self,
        _account: ObjectId,
        stop: ObjectId,
        limit: u32,
        start: ObjectId,
    ) -> LookupResult<Vec<OperationHistory>> {
        self.record("get_account_history");
        let mut items: Vec<_> = self
            .history
            .iter()
            .filter(|h| start.instance == 0 || h.id.instance <= start.instance)
            .filter(|h| h.id.instance > stop.instance)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.id.instance.cmp(&a.id.instance));
        items.truncate(limit as usize);
        Ok(items)
    }

    async fn get_block(&self, height: u64) -> LookupResult<Block> {
        self.record("get_block");
        self.blocks
            .get(&height)
            .cloned()
            .ok_or_else(|| LookupError::not_found("block", height))
    }

    async fn get_transaction_by_id(&self, tx_id: &str) -> LookupResult<SignedTransaction> {
        self.record("get_transaction_by_id");
        self.transactions
            .get(tx_id)
            .cloned()
            .ok_or_else(|| LookupError::not_found("transaction", tx_id))
    }

    async fn get_dynamic_global_properties(&self) -> LookupResult<DynamicGlobalProperties> {
        self.record("get_dynamic_global_properties");
        Ok(self.props.clone())
    }

    async fn get_required_fees(
        &self,
        operations: &[Operation],
        fee_asset: ObjectId,
    ) -> LookupResult<Vec<AssetAmount>> {
        self.record("get_required_fees");
        Ok(operations
            .iter()
            .map(|op| {
                // 带 memo 的转账更贵
                let memo = op.as_transfer().and_then(|t| t.memo.as_ref()).is_some();
                AssetAmount::new(if memo { 2_000 } else { 1_000 }, fee_asset)
            })
            .collect())
    }

    async fn broadcast_transaction_synchronous(
        &self,
        tx: &SignedTransaction,
    ) -> LookupResult<BroadcastResult> {
        self.record("broadcast_transaction_synchronous");
        self.broadcasted.lock().unwrap().push(tx.clone());
        Ok(self.broadcast_result.clone())
    }
}
