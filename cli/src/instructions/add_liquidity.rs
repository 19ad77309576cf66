use crate::*;

/// 向已有仓位添加流动性
/// Deposit into an existing position, re-centred on the current active bin.
pub async fn execute_add_liquidity<C: Deref<Target = impl Signer> + Clone>(
    pool: &mut DlmmPool<C>,
    position: Pubkey,
    strategy: &StrategyConfig,
    transaction_config: RpcSendTransactionConfig,
    compute_unit_price: Option<Instruction>,
) -> Result<Signature> {
    pool.refetch_states().await?;

    let user = pool.program().payer();
    let UserPositions {
        active_bin,
        user_positions,
    } = pool.get_positions_by_user_and_lb_pair(user).await?;

    if !user_positions
        .iter()
        .any(|user_position| user_position.public_key == position)
    {
        warn!("Position {position} is not among the open positions of {user}");
    }

    let range = BinRange::around(active_bin.bin_id, strategy.interval_range)?;
    info!(
        "Adding liquidity to {position} over bins {}..={} (active bin {})",
        range.min_bin_id, range.max_bin_id, active_bin.bin_id
    );

    let instructions = pool
        .add_liquidity_by_strategy(
            position,
            user,
            strategy.total_x_amount,
            strategy.total_y_amount,
            strategy.strategy_parameters(range),
        )
        .await?;

    let signature = send_instructions(
        pool.program(),
        instructions,
        &[],
        transaction_config,
        compute_unit_price,
    )
    .await?;

    println!("🚀 ~ addLiquidityTxHash: {signature}");

    Ok(signature)
}
