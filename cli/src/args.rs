use anchor_client::solana_sdk::pubkey::Pubkey;
use anchor_client::Cluster;
use clap::*;

use crate::dlmm::types::{StrategyParameters, StrategyType};
use crate::math::BinRange;
use crate::menu::MenuLayout;

/// 默认测试池（devnet）
pub const DEFAULT_POOL: &str = "G7g3bN7Wj1HNPeaxTndGqjmoaq9JMHxvv3QtiGXqBYXi";

/// 全局配置覆盖选项
#[derive(Args, Debug)]
pub struct ConfigOverride {
    /// Cluster override
    /// 集群覆盖设置
    ///
    /// Values = mainnet, testnet, devnet, localnet, or an RPC url.
    /// Default: devnet
    #[clap(global = true, long = "provider.cluster", default_value_t = Cluster::Devnet)]
    pub cluster: Cluster,
    /// Wallet override, used when no private key is given
    /// 钱包覆盖设置（未提供私钥时使用）
    ///
    /// Example: /path/to/wallet/keypair.json
    /// Default: ~/.config/solana/id.json
    #[clap(
        global = true,
        long = "provider.wallet",
        default_value_t = String::from(shellexpand::tilde("~/.config/solana/id.json"))
    )]
    pub wallet: String,
    /// Private key as a list of 64 byte values, e.g. [12,34,...]
    /// 私钥字节列表
    #[clap(global = true, long = "private-key", env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,
    /// Address of the DLMM pool to exercise.
    /// 流动性池地址
    #[clap(global = true, long, env = "DLMM_POOL", default_value = DEFAULT_POOL)]
    pub pool: Pubkey,
    /// Priority fee
    /// 优先费用（用于加速交易）
    #[clap(global = true, long = "priority-fee", default_value_t = 0)]
    pub priority_fee: u64,
    /// Menu layout. basic = without the position listing.
    /// 菜单布局
    #[clap(global = true, long, value_enum, default_value_t = MenuLayout::Full)]
    pub menu: MenuLayout,
}

/// 仓位与流动性参数
#[derive(Args, Debug, Clone)]
pub struct StrategyConfig {
    /// Number of bins on each side of the active bin.
    /// 活跃bin两侧的bin数量
    #[clap(long, default_value_t = 10)]
    pub interval_range: u32,
    /// Amount of token X to deposit.
    #[clap(long, default_value_t = 0)]
    pub total_x_amount: u64,
    /// Amount of token Y to deposit.
    #[clap(long, default_value_t = 100_000_000)]
    pub total_y_amount: u64,
    /// Liquidity distribution strategy.
    /// 流动性分配策略
    #[clap(long, value_enum, default_value_t = StrategyType::SpotOneSide)]
    pub strategy_type: StrategyType,
}

impl StrategyConfig {
    pub fn strategy_parameters(&self, range: BinRange) -> StrategyParameters {
        StrategyParameters::new(range.min_bin_id, range.max_bin_id, self.strategy_type)
    }
}

/// 交易参数
#[derive(Args, Debug, Clone, Copy)]
pub struct SwapConfig {
    /// Amount of token to be sold.
    /// 要卖出的代币数量（精确输入）
    #[clap(long, default_value_t = 100)]
    pub swap_amount: u64,
    /// Swap direction. true = sell token X for Y, false = sell token Y for X.
    /// 交易方向：true = 用X代币买Y代币（默认），false = 用Y代币买X代币
    #[clap(long, default_value_t = true, action = ArgAction::Set)]
    pub swap_for_y: bool,
    /// Slippage tolerance in basis points applied to the quoted output.
    /// 滑点容忍度（基点）
    #[clap(long, default_value_t = 10)]
    pub slippage_bps: u16,
}

#[derive(Parser, Debug)]
#[clap(version, about, author)]
pub struct Cli {
    #[clap(flatten)]
    pub config_override: ConfigOverride,
    #[clap(flatten)]
    pub strategy: StrategyConfig,
    #[clap(flatten)]
    pub swap: SwapConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_devnet_exercise() {
        let cli = Cli::try_parse_from(["dlmm-strategy"]).unwrap();
        assert_eq!(cli.config_override.cluster, Cluster::Devnet);
        assert_eq!(cli.config_override.priority_fee, 0);
        assert_eq!(cli.config_override.menu, MenuLayout::Full);
        assert_eq!(cli.strategy.interval_range, 10);
        assert_eq!(cli.strategy.total_x_amount, 0);
        assert_eq!(cli.strategy.total_y_amount, 100_000_000);
        assert_eq!(cli.strategy.strategy_type, StrategyType::SpotOneSide);
        assert_eq!(cli.swap.swap_amount, 100);
        assert!(cli.swap.swap_for_y);
        assert_eq!(cli.swap.slippage_bps, 10);
    }

    #[test]
    fn overrides_are_parsed() {
        let pool = Pubkey::new_unique();
        let cli = Cli::try_parse_from([
            "dlmm-strategy",
            "--provider.cluster",
            "localnet",
            "--pool",
            &pool.to_string(),
            "--menu",
            "basic",
            "--interval-range",
            "5",
            "--strategy-type",
            "curve-one-side",
            "--swap-for-y",
            "false",
            "--slippage-bps",
            "100",
        ])
        .unwrap();
        assert_eq!(cli.config_override.cluster, Cluster::Localnet);
        assert_eq!(cli.config_override.pool, pool);
        assert_eq!(cli.config_override.menu, MenuLayout::Basic);
        assert_eq!(cli.strategy.interval_range, 5);
        assert_eq!(cli.strategy.strategy_type, StrategyType::CurveOneSide);
        assert!(!cli.swap.swap_for_y);
        assert_eq!(cli.swap.slippage_bps, 100);
    }

    #[test]
    fn strategy_parameters_span_the_range() {
        let cli = Cli::try_parse_from(["dlmm-strategy"]).unwrap();
        let params = cli.strategy.strategy_parameters(BinRange::around(100, 10).unwrap());
        assert_eq!(params.min_bin_id, 90);
        assert_eq!(params.max_bin_id, 110);
        assert_eq!(params.strategy_type, StrategyType::SpotOneSide);
    }

    #[test]
    fn rejects_invalid_pool() {
        assert!(Cli::try_parse_from(["dlmm-strategy", "--pool", "not-a-key"]).is_err());
    }
}
