use crate::*;

/// 每笔交易申请的计算单元上限
pub const COMPUTE_UNIT_LIMIT: u32 = 1_400_000;

/// 获取设置计算单元价格的指令
/// 用于设置交易的优先费用，提高交易被打包的概率
///
/// # 返回
/// * 如果价格大于0，返回设置计算单元价格的指令
/// * 如果价格为0，返回None（不设置优先费用）
pub fn get_set_compute_unit_price_ix(micro_lamports: u64) -> Option<Instruction> {
    if micro_lamports > 0 {
        Some(ComputeBudgetInstruction::set_compute_unit_price(
            micro_lamports,
        ))
    } else {
        None
    }
}

/// 发送一笔交易：计算单元上限、可选优先费用、业务指令，钱包之外的签名者
/// Send one transaction: compute limit, optional priority fee, then `instructions`.
/// The payer always signs; `signers` are the extra signers (e.g. a new position).
pub async fn send_instructions<C: Deref<Target = impl Signer> + Clone>(
    program: &Program<C>,
    instructions: Vec<Instruction>,
    signers: &[Arc<Keypair>],
    transaction_config: RpcSendTransactionConfig,
    compute_unit_price: Option<Instruction>,
) -> Result<Signature> {
    let compute_budget_ix = ComputeBudgetInstruction::set_compute_unit_limit(COMPUTE_UNIT_LIMIT);

    let mut request_builder = program.request().instruction(compute_budget_ix);

    if let Some(compute_unit_price_ix) = compute_unit_price {
        request_builder = request_builder.instruction(compute_unit_price_ix);
    }

    for instruction in instructions {
        request_builder = request_builder.instruction(instruction);
    }

    for signer in signers {
        request_builder = request_builder.signer(signer.clone());
    }

    debug!("Sending transaction with {} extra signer(s)", signers.len());

    let signature = request_builder
        .send_with_spinner_and_config(transaction_config)
        .await?;

    Ok(signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_priority_fee_adds_no_instruction() {
        assert!(get_set_compute_unit_price_ix(0).is_none());
        let ix = get_set_compute_unit_price_ix(5_000).unwrap();
        assert_eq!(
            ix,
            ComputeBudgetInstruction::set_compute_unit_price(5_000)
        );
    }
}
