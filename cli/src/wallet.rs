use anchor_client::solana_sdk::signer::keypair::{read_keypair_file, Keypair};

use crate::error::WalletError;

const KEYPAIR_LENGTH: usize = 64;

/// 解析形如 `[12, 34, ...]` 的私钥字节列表
/// Parse a private key written as a list of byte values, e.g. `[12, 34, ...]`
#[allow(deprecated)]
pub fn parse_private_key(raw: &str) -> Result<Keypair, WalletError> {
    let bytes: Vec<u8> = serde_json::from_str(raw.trim())?;
    if bytes.len() != KEYPAIR_LENGTH {
        return Err(WalletError::InvalidLength(bytes.len()));
    }
    Keypair::from_bytes(&bytes).map_err(|err| WalletError::InvalidKeypair(err.to_string()))
}

/// 加载用户钱包：优先使用 PRIVATE_KEY，否则读取密钥对文件
/// Load the user's keypair, preferring the `PRIVATE_KEY` value over the wallet file
pub fn load_payer(private_key: Option<&str>, wallet_path: &str) -> Result<Keypair, WalletError> {
    match private_key {
        Some(raw) => parse_private_key(raw),
        None => read_keypair_file(wallet_path).map_err(|err| WalletError::Missing {
            path: wallet_path.to_string(),
            reason: err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_client::solana_sdk::signer::Signer;

    #[test]
    fn parses_byte_list() {
        let keypair = Keypair::new();
        let raw = format!("{:?}", keypair.to_bytes().to_vec());
        let parsed = parse_private_key(&format!("  {raw}\n")).unwrap();
        assert_eq!(parsed.pubkey(), keypair.pubkey());
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            parse_private_key("[1, 2, 3]"),
            Err(WalletError::InvalidLength(3))
        ));
    }

    #[test]
    fn rejects_non_byte_values() {
        assert!(matches!(
            parse_private_key("[1, 2, 300]"),
            Err(WalletError::NotByteList(_))
        ));
        assert!(matches!(
            parse_private_key("not a key"),
            Err(WalletError::NotByteList(_))
        ));
    }

    #[test]
    fn missing_wallet_file_is_reported() {
        let err = load_payer(None, "/definitely/not/here/id.json").unwrap_err();
        assert!(matches!(err, WalletError::Missing { .. }));
    }
}
