//! 转账备注（memo）编解码
//!
//! 曲线运算与对称加密不在本模块内实现，由调用方通过 [`MemoCipher`] 注入。
//! 本模块只负责：密钥材料解析、nonce 生成、信封字段组装与 hex 密文处理。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::keys::{PrivateKey, PublicKey};
use crate::{
    error::{AdapterError, Result},
    utils::serde_utils::number_or_string,
};

/// 链上 memo 信封
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoEnvelope {
    pub from: PublicKey,
    pub to: PublicKey,
    #[serde(with = "number_or_string")]
    pub nonce: u64,
    /// 密文，小写 hex
    pub message: String,
}

/// 外部提供的 memo 加解密能力
pub trait MemoCipher: Send + Sync {
    fn encrypt(
        &self,
        private_key: &PrivateKey,
        public_key: &PublicKey,
        nonce: u64,
        plaintext: &str,
    ) -> anyhow::Result<Vec<u8>>;

    fn decrypt(
        &self,
        private_key: &PrivateKey,
        public_key: &PublicKey,
        nonce: u64,
        ciphertext: &[u8],
    ) -> anyhow::Result<String>;
}

impl MemoEnvelope {
    pub fn ciphertext(&self) -> Result<Vec<u8>> {
        hex::decode(&self.message).map_err(|e| AdapterError::InvalidCiphertext(e.to_string()))
    }

    /// 私钥属于 `from` 时对端是 `to`，否则对端是 `from`
    pub fn counterparty(&self, own: &PublicKey) -> &PublicKey {
        if own == &self.from {
            &self.to
        } else {
            &self.from
        }
    }

    pub fn decrypt(&self, cipher: &dyn MemoCipher, private_key: &PrivateKey) -> Result<String> {
        let ciphertext = self.ciphertext()?;
        let own = private_key.public_key()?;
        cipher
            .decrypt(private_key, self.counterparty(&own), self.nonce, &ciphertext)
            .map_err(|e| AdapterError::MemoCipher(format!("{:#}", e)))
    }
}

/// 使用随机 nonce 加密 memo
pub fn encrypt_memo(
    cipher: &dyn MemoCipher,
    sender_private_hex: &str,
    plaintext: &str,
    from: &PublicKey,
    to: &PublicKey,
) -> Result<MemoEnvelope> {
    encrypt_memo_with_nonce(
        cipher,
        sender_private_hex,
        plaintext,
        from,
        to,
        rand::random::<u64>(),
    )
}

pub fn encrypt_memo_with_nonce(
    cipher: &dyn MemoCipher,
    sender_private_hex: &str,
    plaintext: &str,
    from: &PublicKey,
    to: &PublicKey,
    nonce: u64,
) -> Result<MemoEnvelope> {
    let private_key = PrivateKey::from_hex(sender_private_hex)?;
    let ciphertext = cipher
        .encrypt(&private_key, to, nonce, plaintext)
        .map_err(|e| AdapterError::MemoCipher(format!("{:#}", e)))?;

    Ok(MemoEnvelope {
        from: *from,
        to: *to,
        nonce,
        message: hex::encode(ciphertext),
    })
}

/// 由信封字段解密 memo，私钥可以是发送方或接收方的
pub fn decrypt_memo(
    cipher: &dyn MemoCipher,
    private_hex: &str,
    from_address: &str,
    to_address: &str,
    message_hex: &str,
    nonce: u64,
) -> Result<String> {
    let private_key = PrivateKey::from_hex(private_hex)?;
    let envelope = MemoEnvelope {
        from: PublicKey::from_address(from_address)?,
        to: PublicKey::from_address(to_address)?,
        nonce,
        message: message_hex.to_string(),
    };
    envelope.decrypt(cipher, &private_key)
}

/// 标准化时用于读取 memo 明文的私钥 + 加解密能力
#[derive(Clone)]
pub struct MemoReader {
    private_key: PrivateKey,
    public_key: PublicKey,
    cipher: Arc<dyn MemoCipher>,
}

impl MemoReader {
    pub fn new(private_key: PrivateKey, cipher: Arc<dyn MemoCipher>) -> Result<Self> {
        let public_key = private_key.public_key()?;
        Ok(Self {
            private_key,
            public_key,
            cipher,
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// memo 的收发任一方是本密钥
    pub fn can_read(&self, memo: &MemoEnvelope) -> bool {
        memo.from == self.public_key || memo.to == self.public_key
    }

    pub fn read(&self, memo: &MemoEnvelope) -> Result<String> {
        memo.decrypt(self.cipher.as_ref(), &self.private_key)
    }
}

impl std::fmt::Debug for MemoReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoReader")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}
