//! 交易签名
//!
//! 摘要 = `sha256(chain_id ‖ 交易二进制)`。签名为 65 字节紧凑格式
//! `(27 + 4 + recovery_id) ‖ r ‖ s`，且必须满足 Graphene 的 canonical 规则，
//! 不满足时换随机 nonce 重签。

use bitcoin::hashes::{sha256, Hash};
use k256::ecdsa::{
    signature::hazmat::{PrehashSigner, RandomizedPrehashSigner},
    RecoveryId, Signature, SigningKey, VerifyingKey,
};

use super::{
    binary::to_bytes,
    keys::{PrivateKey, PublicKey},
    operation::Transaction,
};
use crate::error::{AdapterError, Result};

pub const CHAIN_ID_LEN: usize = 32;
pub const COMPACT_SIGNATURE_LEN: usize = 65;

/// 紧凑签名首字节的偏移（27 + 压缩公钥标记 4）
const COMPACT_HEADER: u8 = 31;
const MAX_SIGN_ATTEMPTS: usize = 64;

fn chain_id_bytes(chain_id: &str) -> Result<[u8; CHAIN_ID_LEN]> {
    let raw = hex::decode(chain_id.trim())?;
    raw.try_into().map_err(|raw: Vec<u8>| {
        AdapterError::DecodeError(format!(
            "chain id must be {} bytes, got {}",
            CHAIN_ID_LEN,
            raw.len()
        ))
    })
}

/// 待签名摘要
pub fn signing_digest(chain_id: &str, tx: &Transaction) -> Result<[u8; 32]> {
    let mut data = chain_id_bytes(chain_id)?.to_vec();
    data.extend_from_slice(&to_bytes(tx)?);
    Ok(sha256::Hash::hash(&data).to_byte_array())
}

/// r、s 都不能有多余的前导零，且最高位为 0
pub fn is_canonical(rs: &[u8]) -> bool {
    rs.len() == 64
        && rs[0] & 0x80 == 0
        && !(rs[0] == 0 && rs[1] & 0x80 == 0)
        && rs[32] & 0x80 == 0
        && !(rs[32] == 0 && rs[33] & 0x80 == 0)
}

fn recovery_id(
    verifying_key: &VerifyingKey,
    digest: &[u8],
    signature: &Signature,
) -> Result<RecoveryId> {
    (0u8..4)
        .filter_map(RecoveryId::from_byte)
        .find(|id| {
            VerifyingKey::recover_from_prehash(digest, signature, *id)
                .map(|recovered| &recovered == verifying_key)
                .unwrap_or(false)
        })
        .ok_or_else(|| AdapterError::SigningFailed("no recovery id matches signer".into()))
}

/// 对摘要生成 canonical 紧凑签名
pub fn sign_digest(
    private_key: &PrivateKey,
    digest: &[u8; 32],
) -> Result<[u8; COMPACT_SIGNATURE_LEN]> {
    let signing_key = SigningKey::from_slice(private_key.as_bytes())
        .map_err(|_| AdapterError::InvalidPrivateKey("scalar out of range".into()))?;
    let verifying_key = *signing_key.verifying_key();
    let mut rng = rand::thread_rng();

    for attempt in 0..MAX_SIGN_ATTEMPTS {
        // 第一次用 RFC6979 确定性 nonce
        let signed = if attempt == 0 {
            PrehashSigner::<Signature>::sign_prehash(&signing_key, digest)
        } else {
            RandomizedPrehashSigner::<Signature>::sign_prehash_with_rng(
                &signing_key,
                &mut rng,
                digest,
            )
        };
        let signature = signed.map_err(|e| AdapterError::SigningFailed(e.to_string()))?;
        let signature = signature.normalize_s().unwrap_or(signature);

        let rs = signature.to_bytes();
        if !is_canonical(&rs) {
            continue;
        }

        let id = recovery_id(&verifying_key, digest, &signature)?;
        let mut compact = [0u8; COMPACT_SIGNATURE_LEN];
        compact[0] = COMPACT_HEADER + id.to_byte();
        compact[1..].copy_from_slice(&rs);
        return Ok(compact);
    }

    Err(AdapterError::SigningFailed(format!(
        "no canonical signature after {} attempts",
        MAX_SIGN_ATTEMPTS
    )))
}

/// 签名交易，返回 hex 紧凑签名
pub fn sign_transaction(
    private_key: &PrivateKey,
    chain_id: &str,
    tx: &Transaction,
) -> Result<String> {
    let digest = signing_digest(chain_id, tx)?;
    Ok(hex::encode(sign_digest(private_key, &digest)?))
}

/// 从紧凑签名恢复签名者公钥
pub fn recover_signer(chain_id: &str, tx: &Transaction, signature_hex: &str) -> Result<PublicKey> {
    let compact = hex::decode(signature_hex.trim())?;
    if compact.len() != COMPACT_SIGNATURE_LEN {
        return Err(AdapterError::DecodeError(format!(
            "signature must be {} bytes, got {}",
            COMPACT_SIGNATURE_LEN,
            compact.len()
        )));
    }

    let id = compact[0]
        .checked_sub(COMPACT_HEADER)
        .and_then(RecoveryId::from_byte)
        .ok_or_else(|| AdapterError::DecodeError("bad signature header byte".into()))?;
    let signature = Signature::from_slice(&compact[1..])
        .map_err(|e| AdapterError::DecodeError(format!("signature: {}", e)))?;

    let digest = signing_digest(chain_id, tx)?;
    let key = VerifyingKey::recover_from_prehash(&digest, &signature, id)
        .map_err(|e| AdapterError::SigningFailed(e.to_string()))?;
    PublicKey::from_bytes(key.to_encoded_point(true).as_bytes())
}
