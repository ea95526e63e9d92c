//! 校验和
//!
//! WIF 私钥使用 sha256d 的前 4 字节；链上地址使用 ripemd160 的前 4 字节。

use bitcoin::hashes::{ripemd160, sha256d, Hash};

pub const CHECKSUM_LEN: usize = 4;

/// 双 SHA-256，取前 4 字节
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = sha256d::Hash::hash(data).to_byte_array();
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

/// RIPEMD-160，取前 4 字节（公钥地址使用）
pub fn ripemd160_checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = ripemd160::Hash::hash(data).to_byte_array();
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}
