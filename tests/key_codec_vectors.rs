//! 密钥与地址编解码向量测试
//!
//! 测试向量：
//! - 私钥 8bf481ab...3141 ⇔ WIF 5JsvYffK...NABo
//! - 该私钥的压缩公钥 0220843d...9ae3 ⇔ GXC58owo...LLWb

use gxc_adapter::{
    domain::{keys, PrivateKey, PublicKey},
    error::AdapterError,
};
use k256::elliptic_curve::sec1::ToEncodedPoint;

const PRIVATE_HEX: &str = "8bf481abeecbb3654e5f8581af0c8bd8d83df31fb2df8cac0440c100d84a3141";
const WIF: &str = "5JsvYffKR8n4yNfCk36KkKFCzg6vo5fdBqqDJLavSifXSV9NABo";
const PUBLIC_HEX: &str = "0220843df25002cef45f3a5896806d4b11fcd3f554693107c24622c4bdd1199ae3";
const ADDRESS: &str = "GXC58owosbFrudGVp8VCuMvDWpenx7AZSLwxEtAVqjWeqZ4YVLLWb";

const OTHER_PUBLIC_HEX: &str =
    "03b01ede2e604082a4451d419a22a7d9e64fb0005438f822a3ed2a891ad84ea38b";
const OTHER_ADDRESS: &str = "GXC8AoHzhXhMRV9AFTihMAcQPNXKFEZCeYNYomdcc7vh8Gzp7b7xP";

#[test]
fn test_private_key_vector() {
    assert_eq!(keys::private_hex_to_wif(PRIVATE_HEX).unwrap(), WIF);
    assert_eq!(keys::wif_to_private_hex(WIF).unwrap(), PRIVATE_HEX);

    let raw = hex::decode(PRIVATE_HEX).unwrap();
    assert_eq!(keys::private_bytes_to_wif(&raw).unwrap(), WIF);
    assert_eq!(keys::wif_to_private_bytes(WIF).unwrap().as_bytes()[..], raw[..]);
}

#[test]
fn test_public_key_vectors() {
    for (public_hex, address) in [(PUBLIC_HEX, ADDRESS), (OTHER_PUBLIC_HEX, OTHER_ADDRESS)] {
        assert_eq!(keys::public_hex_to_address(public_hex).unwrap(), address);
        assert_eq!(keys::address_to_public_hex(address).unwrap(), public_hex);

        let raw = hex::decode(public_hex).unwrap();
        assert_eq!(keys::public_bytes_to_address(&raw).unwrap(), address);
        assert_eq!(keys::address_to_public_bytes(address).unwrap().as_bytes()[..], raw[..]);
    }
}

#[test]
fn test_wif_derives_vector_address() {
    let private = PrivateKey::from_wif(WIF).unwrap();
    let public = private.public_key().unwrap();
    assert_eq!(public.to_hex(), PUBLIC_HEX);
    assert_eq!(public.to_string(), ADDRESS);

    assert_eq!(keys::public_key_from_private(PRIVATE_HEX).unwrap(), public);
}

#[test]
fn test_error_classification() {
    assert_eq!(
        keys::address_to_public_hex("EOS58owosbFrudGVp8VCuMvDWpenx7AZSLwxEtAVqjWeqZ4YVLLWb"),
        Err(AdapterError::PrefixMismatch { expected: "GXC" })
    );
    assert!(matches!(
        keys::address_to_public_hex("GXC0OIl"),
        Err(AdapterError::DecodeError(_))
    ));
    // 末位字符加一只改变校验和的最后一个字节
    assert_eq!(
        keys::wif_to_private_hex("5JsvYffKR8n4yNfCk36KkKFCzg6vo5fdBqqDJLavSifXSV9NABp"),
        Err(AdapterError::ChecksumMismatch)
    );
    assert!(matches!(
        keys::private_hex_to_wif(&"00".repeat(32)),
        Err(AdapterError::InvalidPrivateKey(_))
    ));
    assert!(matches!(
        keys::public_hex_to_address(&format!("04{}", "11".repeat(64))),
        Err(AdapterError::InvalidPublicKey(_))
    ));
}

#[test]
fn test_public_key_parses_from_address_string() {
    let key: PublicKey = OTHER_ADDRESS.parse().unwrap();
    assert_eq!(key.to_hex(), OTHER_PUBLIC_HEX);
    assert_eq!(
        serde_json::to_value(key).unwrap(),
        serde_json::Value::String(OTHER_ADDRESS.into())
    );
}

#[test]
fn test_random_keys_round_trip() {
    let mut rng = rand::thread_rng();
    for _ in 0..64 {
        let secret = k256::SecretKey::random(&mut rng);
        let private_hex = hex::encode(secret.to_bytes());

        let wif = keys::private_hex_to_wif(&private_hex).unwrap();
        assert_eq!(keys::wif_to_private_hex(&wif).unwrap(), private_hex);

        let public_hex = hex::encode(secret.public_key().to_encoded_point(true).as_bytes());
        let address = keys::public_hex_to_address(&public_hex).unwrap();
        assert!(address.starts_with("GXC"));
        assert_eq!(keys::address_to_public_hex(&address).unwrap(), public_hex);
        assert_eq!(
            keys::public_key_from_private(&private_hex).unwrap().to_address(),
            address
        );
    }
}

#[test]
fn test_random_keys_reject_any_checksum_flip() {
    let mut rng = rand::thread_rng();
    for _ in 0..16 {
        let secret = k256::SecretKey::random(&mut rng);
        let private = PrivateKey::from_bytes(&secret.to_bytes()).unwrap();

        let wif_raw = bs58::decode(private.to_wif()).into_vec().unwrap();
        let address = private.public_key().unwrap().to_address();
        let addr_raw = bs58::decode(&address[3..]).into_vec().unwrap();

        for back in 1..=4 {
            let mut tampered = wif_raw.clone();
            let pos = tampered.len() - back;
            tampered[pos] ^= 0x01;
            assert_eq!(
                PrivateKey::from_wif(&bs58::encode(tampered).into_string()),
                Err(AdapterError::ChecksumMismatch)
            );

            let mut tampered = addr_raw.clone();
            let pos = tampered.len() - back;
            tampered[pos] ^= 0x01;
            let tampered = format!("GXC{}", bs58::encode(tampered).into_string());
            assert_eq!(
                PublicKey::from_address(&tampered),
                Err(AdapterError::ChecksumMismatch)
            );
        }
    }
}
