use crate::*;

/// 执行初始化仓位指令
/// Executes the initialize position instruction
///
/// # 功能说明 / Functionality
/// 以活跃bin为中心创建单边仓位，并按策略一次性存入流动性。
/// 仓位密钥对与钱包共同签名。
/// Opens a one-sided position centred on the active bin and deposits into it in the
/// same transaction. The position keypair co-signs with the wallet.
pub async fn execute_initialize_position<C: Deref<Target = impl Signer> + Clone>(
    pool: &mut DlmmPool<C>,
    position: &Arc<Keypair>,
    strategy: &StrategyConfig,
    transaction_config: RpcSendTransactionConfig,
    compute_unit_price: Option<Instruction>,
) -> Result<Signature> {
    pool.refetch_states().await?;

    let active_bin = pool.get_active_bin()?;
    let range = BinRange::around(active_bin.bin_id, strategy.interval_range)?;
    info!(
        "Active bin {} (price per lamport {}, per token {}), opening position {} over bins {}..={}",
        active_bin.bin_id,
        active_bin.price_per_lamport,
        active_bin.price_per_token,
        position.pubkey(),
        range.min_bin_id,
        range.max_bin_id
    );

    let user = pool.program().payer();
    let instructions = pool
        .initialize_position_and_add_liquidity_by_strategy(
            position.pubkey(),
            user,
            strategy.total_x_amount,
            strategy.total_y_amount,
            strategy.strategy_parameters(range),
        )
        .await?;

    let signature = send_instructions(
        pool.program(),
        instructions,
        &[position.clone()],
        transaction_config,
        compute_unit_price,
    )
    .await?;

    println!("🚀 ~ createOneSidePositionTxHash: {signature}");

    Ok(signature)
}
