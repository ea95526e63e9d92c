//! 密钥与地址编解码
//!
//! - 私钥 ⇄ WIF：`Base58(0x80 ‖ 私钥32字节 ‖ sha256d校验和4字节)`
//! - 公钥 ⇄ 链地址：`"GXC" ‖ Base58(压缩公钥33字节 ‖ ripemd160校验和4字节)`
//!
//! 所有转换都是纯函数，且满足往返律：`decode(encode(x)) == x`。

use std::{fmt, str::FromStr};

use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::checksum::{checksum, ripemd160_checksum, CHECKSUM_LEN};
use crate::error::{AdapterError, Result};

/// 链地址前缀（编解码契约的一部分，不可按调用配置）
pub const ADDRESS_PREFIX: &str = "GXC";
/// WIF 版本字节
pub const WIF_VERSION: u8 = 0x80;
pub const PRIVATE_KEY_LEN: usize = 32;
pub const PUBLIC_KEY_LEN: usize = 33;

/// WIF 末尾可选的压缩标记
const WIF_COMPRESSED_FLAG: u8 = 0x01;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 私钥
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// secp256k1 私钥标量，drop 时清零
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; PRIVATE_KEY_LEN]);

impl PrivateKey {
    /// 校验长度与标量范围（非零且小于曲线阶）
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() != PRIVATE_KEY_LEN {
            return Err(AdapterError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_LEN,
                raw.len()
            )));
        }
        k256::SecretKey::from_slice(raw)
            .map_err(|_| AdapterError::InvalidPrivateKey("scalar out of range".into()))?;

        let mut bytes = [0u8; PRIVATE_KEY_LEN];
        bytes.copy_from_slice(raw);
        Ok(Self(bytes))
    }

    pub fn from_hex(private_hex: &str) -> Result<Self> {
        let raw = hex::decode(private_hex.trim())?;
        Self::from_bytes(&raw)
    }

    /// 解析 WIF：先校验校验和，再检查版本字节与长度
    pub fn from_wif(wif: &str) -> Result<Self> {
        let decoded = bs58::decode(wif.trim())
            .into_vec()
            .map_err(|e| AdapterError::DecodeError(format!("base58: {}", e)))?;
        if decoded.len() <= CHECKSUM_LEN {
            return Err(AdapterError::DecodeError(format!(
                "wif too short: {} bytes",
                decoded.len()
            )));
        }

        let (payload, check) = decoded.split_at(decoded.len() - CHECKSUM_LEN);
        if checksum(payload) != check {
            return Err(AdapterError::ChecksumMismatch);
        }

        let key = match payload {
            [WIF_VERSION, key @ ..] if key.len() == PRIVATE_KEY_LEN => key,
            [WIF_VERSION, key @ .., WIF_COMPRESSED_FLAG] if key.len() == PRIVATE_KEY_LEN => key,
            [WIF_VERSION, ..] => {
                return Err(AdapterError::InvalidPrivateKey(format!(
                    "unexpected wif payload length {}",
                    payload.len()
                )))
            }
            _ => {
                return Err(AdapterError::InvalidPrivateKey(
                    "unexpected wif version byte".into(),
                ))
            }
        };
        Self::from_bytes(key)
    }

    pub fn to_wif(&self) -> String {
        let mut raw = Vec::with_capacity(1 + PRIVATE_KEY_LEN + CHECKSUM_LEN);
        raw.push(WIF_VERSION);
        raw.extend_from_slice(&self.0);
        let check = checksum(&raw);
        raw.extend_from_slice(&check);
        let wif = bs58::encode(&raw).into_string();
        raw.zeroize();
        wif
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_LEN] {
        &self.0
    }

    /// 推导压缩公钥
    pub fn public_key(&self) -> Result<PublicKey> {
        let secret = k256::SecretKey::from_slice(&self.0)
            .map_err(|_| AdapterError::InvalidPrivateKey("scalar out of range".into()))?;
        let point = secret.public_key().to_encoded_point(true);
        PublicKey::from_bytes(point.as_bytes())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 公钥
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 压缩格式 secp256k1 公钥（33 字节，已验证在曲线上）
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() != PUBLIC_KEY_LEN {
            return Err(AdapterError::InvalidPublicKey(format!(
                "expected {} compressed bytes, got {}",
                PUBLIC_KEY_LEN,
                raw.len()
            )));
        }
        k256::PublicKey::from_sec1_bytes(raw)
            .map_err(|_| AdapterError::InvalidPublicKey("point is not on secp256k1".into()))?;

        let mut bytes = [0u8; PUBLIC_KEY_LEN];
        bytes.copy_from_slice(raw);
        Ok(Self(bytes))
    }

    pub fn from_hex(public_hex: &str) -> Result<Self> {
        let raw = hex::decode(public_hex.trim())?;
        Self::from_bytes(&raw)
    }

    /// 解析链地址：前缀 → Base58 → 长度 → ripemd160 校验和 → 曲线点
    pub fn from_address(address: &str) -> Result<Self> {
        let encoded = address
            .strip_prefix(ADDRESS_PREFIX)
            .ok_or(AdapterError::PrefixMismatch {
                expected: ADDRESS_PREFIX,
            })?;

        let decoded = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| AdapterError::DecodeError(format!("base58: {}", e)))?;
        if decoded.len() <= CHECKSUM_LEN {
            return Err(AdapterError::InvalidAddress(format!(
                "decoded payload too short: {} bytes",
                decoded.len()
            )));
        }

        let (key, check) = decoded.split_at(decoded.len() - CHECKSUM_LEN);
        if ripemd160_checksum(key) != check {
            return Err(AdapterError::ChecksumMismatch);
        }
        Self::from_bytes(key)
    }

    pub fn to_address(&self) -> String {
        let mut raw = Vec::with_capacity(PUBLIC_KEY_LEN + CHECKSUM_LEN);
        raw.extend_from_slice(&self.0);
        raw.extend_from_slice(&ripemd160_checksum(&self.0));
        format!("{}{}", ADDRESS_PREFIX, bs58::encode(raw).into_string())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_address())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_address())
    }
}

impl FromStr for PublicKey {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_address(s)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let address = String::deserialize(deserializer)?;
        Self::from_address(&address).map_err(serde::de::Error::custom)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 字节 / hex 形式的转换入口
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn private_bytes_to_wif(raw: &[u8]) -> Result<String> {
    Ok(PrivateKey::from_bytes(raw)?.to_wif())
}

pub fn wif_to_private_bytes(wif: &str) -> Result<PrivateKey> {
    PrivateKey::from_wif(wif)
}

pub fn public_bytes_to_address(raw: &[u8]) -> Result<String> {
    Ok(PublicKey::from_bytes(raw)?.to_address())
}

pub fn address_to_public_bytes(address: &str) -> Result<PublicKey> {
    PublicKey::from_address(address)
}

pub fn private_hex_to_wif(private_hex: &str) -> Result<String> {
    Ok(PrivateKey::from_hex(private_hex)?.to_wif())
}

pub fn wif_to_private_hex(wif: &str) -> Result<String> {
    Ok(PrivateKey::from_wif(wif)?.to_hex())
}

pub fn public_hex_to_address(public_hex: &str) -> Result<String> {
    Ok(PublicKey::from_hex(public_hex)?.to_address())
}

pub fn address_to_public_hex(address: &str) -> Result<String> {
    Ok(PublicKey::from_address(address)?.to_hex())
}

/// hex 私钥 → 压缩公钥
pub fn public_key_from_private(private_hex: &str) -> Result<PublicKey> {
    PrivateKey::from_hex(private_hex)?.public_key()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_WIF: &str = "5JsvYffKR8n4yNfCk36KkKFCzg6vo5fdBqqDJLavSifXSV9NABo";
    const TEST_PRIVATE_HEX: &str =
        "8bf481abeecbb3654e5f8581af0c8bd8d83df31fb2df8cac0440c100d84a3141";
    const TEST_PUBLIC_HEX: &str =
        "0220843df25002cef45f3a5896806d4b11fcd3f554693107c24622c4bdd1199ae3";
    const TEST_ADDRESS: &str = "GXC58owosbFrudGVp8VCuMvDWpenx7AZSLwxEtAVqjWeqZ4YVLLWb";

    #[test]
    fn test_wif_vector() {
        assert_eq!(wif_to_private_hex(TEST_WIF).unwrap(), TEST_PRIVATE_HEX);
        assert_eq!(private_hex_to_wif(TEST_PRIVATE_HEX).unwrap(), TEST_WIF);
    }

    #[test]
    fn test_address_vector() {
        assert_eq!(public_hex_to_address(TEST_PUBLIC_HEX).unwrap(), TEST_ADDRESS);
        assert_eq!(address_to_public_hex(TEST_ADDRESS).unwrap(), TEST_PUBLIC_HEX);
    }

    #[test]
    fn test_public_key_from_private() {
        let key = PrivateKey::from_wif(TEST_WIF).unwrap();
        assert_eq!(key.public_key().unwrap().to_address(), TEST_ADDRESS);
    }

    #[test]
    fn test_rejects_zero_and_out_of_range_scalar() {
        assert!(matches!(
            private_bytes_to_wif(&[0u8; 32]),
            Err(AdapterError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            private_bytes_to_wif(&[0xffu8; 32]),
            Err(AdapterError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            private_bytes_to_wif(&[1u8; 31]),
            Err(AdapterError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_wif_checksum_flip_rejected() {
        let raw = bs58::decode(TEST_WIF).into_vec().unwrap();
        for pos in raw.len() - CHECKSUM_LEN..raw.len() {
            let mut tampered = raw.clone();
            tampered[pos] ^= 0x01;
            assert_eq!(
                wif_to_private_bytes(&bs58::encode(tampered).into_string()).unwrap_err(),
                AdapterError::ChecksumMismatch,
                "checksum byte {}",
                pos
            );
        }
    }

    #[test]
    fn test_address_checksum_flip_rejected() {
        let raw = bs58::decode(&TEST_ADDRESS[ADDRESS_PREFIX.len()..])
            .into_vec()
            .unwrap();
        for pos in raw.len() - CHECKSUM_LEN..raw.len() {
            let mut tampered = raw.clone();
            tampered[pos] ^= 0x80;
            let address = format!("{}{}", ADDRESS_PREFIX, bs58::encode(tampered).into_string());
            assert_eq!(
                address_to_public_bytes(&address).unwrap_err(),
                AdapterError::ChecksumMismatch,
                "checksum byte {}",
                pos
            );
        }
    }

    #[test]
    fn test_wif_accepts_compressed_flag() {
        let mut payload = vec![WIF_VERSION];
        payload.extend_from_slice(&hex::decode(TEST_PRIVATE_HEX).unwrap());
        payload.push(WIF_COMPRESSED_FLAG);
        let check = checksum(&payload);
        payload.extend_from_slice(&check);
        let wif = bs58::encode(payload).into_string();
        assert_eq!(wif_to_private_hex(&wif).unwrap(), TEST_PRIVATE_HEX);
    }

    #[test]
    fn test_wif_wrong_version_rejected() {
        let mut payload = vec![0xef];
        payload.extend_from_slice(&hex::decode(TEST_PRIVATE_HEX).unwrap());
        let check = checksum(&payload);
        payload.extend_from_slice(&check);
        let wif = bs58::encode(payload).into_string();
        assert!(matches!(
            wif_to_private_bytes(&wif),
            Err(AdapterError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_wif_not_base58() {
        assert!(matches!(
            wif_to_private_bytes("0OIl"),
            Err(AdapterError::DecodeError(_))
        ));
    }

    #[test]
    fn test_prefix_checked_before_decode() {
        // 余下部分不是合法 Base58，前缀错误必须先被发现
        assert_eq!(
            address_to_public_bytes("BTS0OIl").unwrap_err(),
            AdapterError::PrefixMismatch {
                expected: ADDRESS_PREFIX
            }
        );
        assert!(matches!(
            address_to_public_bytes("GX"),
            Err(AdapterError::PrefixMismatch { .. })
        ));
    }

    #[test]
    fn test_address_too_short() {
        let short = format!("{}{}", ADDRESS_PREFIX, bs58::encode([1u8, 2, 3]).into_string());
        assert!(matches!(
            address_to_public_bytes(&short),
            Err(AdapterError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_address_checksum_mismatch() {
        let mut raw = hex::decode(TEST_PUBLIC_HEX).unwrap();
        raw.extend_from_slice(&[0, 0, 0, 0]);
        let address = format!("{}{}", ADDRESS_PREFIX, bs58::encode(raw).into_string());
        assert_eq!(
            address_to_public_bytes(&address).unwrap_err(),
            AdapterError::ChecksumMismatch
        );
    }

    #[test]
    fn test_address_off_curve_key() {
        // 33 字节全零不是合法压缩点，但校验和本身正确
        let key = [0u8; PUBLIC_KEY_LEN];
        let mut raw = key.to_vec();
        raw.extend_from_slice(&ripemd160_checksum(&key));
        let address = format!("{}{}", ADDRESS_PREFIX, bs58::encode(raw).into_string());
        assert!(matches!(
            address_to_public_bytes(&address),
            Err(AdapterError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn test_uncompressed_public_key_rejected() {
        let uncompressed = [4u8; 65];
        assert!(matches!(
            public_bytes_to_address(&uncompressed),
            Err(AdapterError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn test_public_key_serde_as_address() {
        let key = PublicKey::from_hex(TEST_PUBLIC_HEX).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", TEST_ADDRESS));
        let back: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_private_key_debug_redacted() {
        let key = PrivateKey::from_hex(TEST_PRIVATE_HEX).unwrap();
        assert!(!format!("{:?}", key).contains("8bf4"));
    }
}
