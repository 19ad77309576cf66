//! 指令参数类型
//! Instruction argument types, borsh encoded exactly as the program expects.

use borsh::BorshSerialize;
use clap::ValueEnum;

/// 流动性分配策略类型
/// Liquidity distribution strategy, computed on-chain by the program
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, ValueEnum)]
pub enum StrategyType {
    SpotOneSide,
    CurveOneSide,
    BidAskOneSide,
    SpotBalanced,
    CurveBalanced,
    BidAskBalanced,
    SpotImBalanced,
    CurveImBalanced,
    BidAskImBalanced,
}

#[derive(Debug, Clone, BorshSerialize)]
pub struct StrategyParameters {
    pub min_bin_id: i32,
    pub max_bin_id: i32,
    pub strategy_type: StrategyType,
    /// 策略的附加参数，当前策略未使用
    pub parameteres: [u8; 64],
}

impl StrategyParameters {
    pub fn new(min_bin_id: i32, max_bin_id: i32, strategy_type: StrategyType) -> Self {
        Self {
            min_bin_id,
            max_bin_id,
            strategy_type,
            parameteres: [0u8; 64],
        }
    }
}

#[derive(Debug, Clone, BorshSerialize)]
pub struct LiquidityParameterByStrategy {
    pub amount_x: u64,
    pub amount_y: u64,
    pub active_id: i32,
    /// 允许活跃bin偏移的最大数量
    pub max_active_bin_slippage: i32,
    pub strategy_parameters: StrategyParameters,
}
