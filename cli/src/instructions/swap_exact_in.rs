use crate::*;

/// 单次交换最多跨越的bin数组数量
pub const SWAP_BIN_ARRAY_COUNT: usize = 3;

/// 执行精确输入的交易
///
/// # 功能
/// 1. 获取交易方向上的bin数组
/// 2. 通过模拟计算交易报价
/// 3. 以报价的最小输出构建并发送交易
pub async fn execute_swap<C: Deref<Target = impl Signer> + Clone>(
    pool: &mut DlmmPool<C>,
    swap: &SwapConfig,
    transaction_config: RpcSendTransactionConfig,
    compute_unit_price: Option<Instruction>,
) -> Result<Signature> {
    let SwapConfig {
        swap_amount,
        swap_for_y,
        slippage_bps,
    } = *swap;

    pool.refetch_states().await?;

    let bin_arrays = pool
        .get_bin_array_for_swap(swap_for_y, SWAP_BIN_ARRAY_COUNT)
        .await?;
    debug!("Swap crosses up to {} bin array(s)", bin_arrays.len());

    let quote = pool
        .swap_quote(swap_amount, swap_for_y, slippage_bps, &bin_arrays)
        .await?;

    println!("🚀 ~ swapQuote: {:#?}", quote);

    // swap_for_y = true 用X换Y，否则用Y换X
    let (in_token, out_token) = if swap_for_y {
        (pool.token_x.public_key, pool.token_y.public_key)
    } else {
        (pool.token_y.public_key, pool.token_x.public_key)
    };

    let instructions = pool.swap(
        in_token,
        out_token,
        swap_amount,
        quote.min_out_amount,
        pool.program().payer(),
        &quote.bin_arrays_pubkey,
    )?;

    let signature = send_instructions(
        pool.program(),
        instructions,
        &[],
        transaction_config,
        compute_unit_price,
    )
    .await?;

    println!("🚀 ~ swapTxHash: {signature}");

    Ok(signature)
}
