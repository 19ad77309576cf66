use crate::*;

/// 移除用户在该池中所有仓位的全部流动性，领取手续费并关闭仓位
/// Drain every position the wallet holds in the pool, claiming fees and closing each one.
/// Stops at the first failing transaction.
pub async fn execute_remove_liquidity<C: Deref<Target = impl Signer> + Clone>(
    pool: &mut DlmmPool<C>,
    transaction_config: RpcSendTransactionConfig,
    compute_unit_price: Option<Instruction>,
) -> Result<Vec<Signature>> {
    pool.refetch_states().await?;

    let user = pool.program().payer();
    let UserPositions { user_positions, .. } = pool.get_positions_by_user_and_lb_pair(user).await?;

    if user_positions.is_empty() {
        info!("No positions of {user} to remove liquidity from");
    }

    let mut signatures = vec![];

    for LbPosition {
        public_key,
        position_data,
    } in user_positions
    {
        let bin_ids = position_data
            .position_bin_data
            .iter()
            .map(|bin| bin.bin_id)
            .collect::<Vec<_>>();

        let (Some(&from_bin_id), Some(&to_bin_id)) = (bin_ids.first(), bin_ids.last()) else {
            warn!("Position {public_key} has no bins, skipping");
            continue;
        };

        debug!("Removing bins {from_bin_id}..={to_bin_id} from {public_key}");

        let transactions = pool.remove_liquidity(
            public_key,
            user,
            from_bin_id,
            to_bin_id,
            BASIS_POINT_MAX as u16,
            true,
        )?;

        for instructions in transactions {
            let signature = send_instructions(
                pool.program(),
                instructions,
                &[],
                transaction_config,
                compute_unit_price.clone(),
            )
            .await?;

            println!("🚀 ~ removeBalanceLiquidityTxHash: {signature}");
            signatures.push(signature);
        }
    }

    Ok(signatures)
}
