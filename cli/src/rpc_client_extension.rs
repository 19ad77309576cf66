use anchor_client::solana_client::nonblocking::rpc_client::RpcClient;
use anchor_client::solana_sdk::pubkey::Pubkey;
use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::dlmm::accounts::AccountLayout;

/// RPC客户端扩展：获取账户并反序列化
/// Fetch-and-decode helpers on top of the nonblocking RPC client
#[async_trait]
pub trait RpcClientExtension {
    /// 获取DLMM账户，要求账户存在
    /// Fetch a DLMM account, failing when it does not exist
    async fn get_dlmm_account<T: AccountLayout + Send>(&self, pubkey: &Pubkey) -> Result<T>;

    /// 批量获取DLMM账户，不存在的账户返回 None
    /// Batch fetch DLMM accounts; missing accounts come back as `None`
    async fn get_multiple_dlmm_accounts<T: AccountLayout + Send>(
        &self,
        pubkeys: &[Pubkey],
    ) -> Result<Vec<Option<T>>>;
}

#[async_trait]
impl RpcClientExtension for RpcClient {
    async fn get_dlmm_account<T: AccountLayout + Send>(&self, pubkey: &Pubkey) -> Result<T> {
        let account = self
            .get_account(pubkey)
            .await
            .with_context(|| format!("{} account {pubkey} not found", T::NAME))?;
        Ok(T::from_account_data(&account.data)?)
    }

    async fn get_multiple_dlmm_accounts<T: AccountLayout + Send>(
        &self,
        pubkeys: &[Pubkey],
    ) -> Result<Vec<Option<T>>> {
        let mut decoded = Vec::with_capacity(pubkeys.len());
        // getMultipleAccounts 每次最多100个 / the RPC caps a batch at 100 keys
        for keys in pubkeys.chunks(100) {
            for account in self.get_multiple_accounts(keys).await? {
                decoded.push(
                    account
                        .map(|account| T::from_account_data(&account.data))
                        .transpose()?,
                );
            }
        }
        Ok(decoded)
    }
}
