use async_trait::async_trait;

use crate::*;

/// 控制台会话：池客户端、本次会话的单边仓位密钥对与交易配置
/// One console run: the pool client, the position keypair generated for this run and the
/// transaction settings shared by every action.
pub struct Session<C> {
    pub pool: DlmmPool<C>,
    pub position: Arc<Keypair>,
    pub strategy: StrategyConfig,
    pub swap: SwapConfig,
    pub transaction_config: RpcSendTransactionConfig,
    pub compute_unit_price: Option<Instruction>,
}

impl<C: Deref<Target = impl Signer> + Clone> Session<C> {
    pub fn new(
        pool: DlmmPool<C>,
        strategy: StrategyConfig,
        swap: SwapConfig,
        transaction_config: RpcSendTransactionConfig,
        compute_unit_price: Option<Instruction>,
    ) -> Self {
        let position = Arc::new(Keypair::new());
        info!("Session position keypair {}", position.pubkey());
        Self {
            pool,
            position,
            strategy,
            swap,
            transaction_config,
            compute_unit_price,
        }
    }
}

#[async_trait(?Send)]
impl<C, S> MenuActions for Session<C>
where
    C: Deref<Target = S> + Clone,
    S: Signer,
{
    async fn initialize_position(&mut self) -> Result<()> {
        execute_initialize_position(
            &mut self.pool,
            &self.position,
            &self.strategy,
            self.transaction_config,
            self.compute_unit_price.clone(),
        )
        .await?;
        Ok(())
    }

    async fn add_liquidity(&mut self) -> Result<()> {
        execute_add_liquidity(
            &mut self.pool,
            self.position.pubkey(),
            &self.strategy,
            self.transaction_config,
            self.compute_unit_price.clone(),
        )
        .await?;
        Ok(())
    }

    async fn remove_liquidity(&mut self) -> Result<()> {
        execute_remove_liquidity(
            &mut self.pool,
            self.transaction_config,
            self.compute_unit_price.clone(),
        )
        .await?;
        Ok(())
    }

    async fn swap(&mut self) -> Result<()> {
        execute_swap(
            &mut self.pool,
            &self.swap,
            self.transaction_config,
            self.compute_unit_price.clone(),
        )
        .await?;
        Ok(())
    }

    async fn display_positions(&mut self) -> Result<()> {
        execute_display_positions(&mut self.pool).await
    }
}
