// DLMM数学计算工具模块
// 提供价格、bin范围、仓位区间状态与滑点相关的计算

use anyhow::{Context, Result};
use rust_decimal::MathematicalOps;
use rust_decimal::{prelude::FromPrimitive, Decimal};

use crate::dlmm::accounts::BinArray;
use crate::dlmm::{BASIS_POINT_MAX, MAX_POSITION_WIDTH, SCALE_OFFSET};

/// 根据bin ID计算每个lamport的价格
///
/// # 参数
/// * `active_id` - bin ID
/// * `bin_step` - bin步长（以基点为单位）
///
/// # 计算公式
/// price = (1 + bin_step / 10000) ^ active_id
pub fn get_price_per_lamport_from_id(active_id: i32, bin_step: u16) -> Option<Decimal> {
    let bps = Decimal::from_u16(bin_step)?.checked_div(Decimal::from_i32(BASIS_POINT_MAX)?)?;
    let base = Decimal::ONE.checked_add(bps)?;
    base.checked_powi(active_id.into())
}

/// 将每个lamport的价格转换为每个代币的价格（UI价格）
///
/// # 计算公式
/// price_per_token = price_per_lamport * 10^base_decimal / 10^quote_decimal
///
/// # 示例
/// 如果每个BTC lamport价格是0.03 USDC lamport，BTC有9位小数，USDC有6位小数，
/// 则每个BTC的价格 = 0.03 * 10^9 / 10^6 = 30 USDC
pub fn price_per_lamport_to_price_per_token(
    price_per_lamport: Decimal,
    base_token_decimal: u8,
    quote_token_decimal: u8,
) -> Option<Decimal> {
    let one_ui_base_token_amount = Decimal::TEN.checked_powu(base_token_decimal.into())?;
    let one_ui_quote_token_amount = Decimal::TEN.checked_powu(quote_token_decimal.into())?;

    one_ui_base_token_amount
        .checked_mul(price_per_lamport)?
        .checked_div(one_ui_quote_token_amount)
}

/// 围绕活跃bin的连续bin区间
/// Contiguous bin interval centred on the active bin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinRange {
    pub min_bin_id: i32,
    pub max_bin_id: i32,
}

impl BinRange {
    /// 活跃bin上下各 `interval` 个bin
    /// `interval` bins on each side of `active_id`
    pub fn around(active_id: i32, interval: u32) -> Result<Self> {
        let interval = i32::try_from(interval).context("interval range overflow")?;
        Ok(Self {
            min_bin_id: active_id
                .checked_sub(interval)
                .context("min bin id overflow")?,
            max_bin_id: active_id
                .checked_add(interval)
                .context("max bin id overflow")?,
        })
    }

    /// 仓位宽度 = max - min + 1，必须在 1..=70 之间
    pub fn width(&self) -> Result<i32> {
        let width = self.max_bin_id - self.min_bin_id + 1;
        anyhow::ensure!(
            (1..=MAX_POSITION_WIDTH).contains(&width),
            crate::error::DlmmError::InvalidPositionWidth(width)
        );
        Ok(width)
    }

    /// 覆盖该区间的bin数组索引（下界、上界）
    pub fn bin_array_indexes(&self) -> (i32, i32) {
        (
            BinArray::bin_id_to_bin_array_index(self.min_bin_id),
            BinArray::bin_id_to_bin_array_index(self.max_bin_id),
        )
    }
}

/// 仓位相对活跃bin的状态
/// Where the active bin sits relative to a position's bin range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeStatus {
    InRange,
    /// 活跃bin低于仓位下界 / active bin is `distance` bins under the lower bin
    Below { distance: u32 },
    /// 活跃bin高于仓位上界 / active bin is `distance` bins over the upper bin
    Above { distance: u32 },
}

impl RangeStatus {
    pub fn of(lower_bin_id: i32, upper_bin_id: i32, active_bin_id: i32) -> Self {
        if lower_bin_id <= active_bin_id && active_bin_id <= upper_bin_id {
            RangeStatus::InRange
        } else if active_bin_id < lower_bin_id {
            RangeStatus::Below {
                distance: lower_bin_id.abs_diff(active_bin_id),
            }
        } else {
            RangeStatus::Above {
                distance: active_bin_id.abs_diff(upper_bin_id),
            }
        }
    }

    pub fn is_in_range(&self) -> bool {
        matches!(self, RangeStatus::InRange)
    }

    pub fn label(&self) -> &'static str {
        if self.is_in_range() {
            "✅ IN RANGE"
        } else {
            "❌ OUT OF RANGE"
        }
    }
}

/// 仓位在某个bin中所占的代币数量
/// share / supply of the bin amount, rounded down; zero for an empty bin
pub fn get_amount_from_share(share: u128, liquidity_supply: u128, bin_amount: u64) -> Result<u64> {
    if liquidity_supply == 0 || share == 0 {
        return Ok(0);
    }
    let amount = match share.checked_mul(u128::from(bin_amount)) {
        Some(product) => product / liquidity_supply,
        // shares are Q64.64 scaled; dropping the fractional half keeps the product in range
        None => {
            let share = share >> SCALE_OFFSET;
            let liquidity_supply = (liquidity_supply >> SCALE_OFFSET).max(1);
            share * u128::from(bin_amount) / liquidity_supply
        }
    };
    u64::try_from(amount).context("position amount exceeds u64")
}

/// 按滑点计算最小输出数量
/// Minimum accepted output after `slippage_bps` of tolerance
pub fn get_min_out_amount(out_amount: u64, slippage_bps: u16) -> u64 {
    let slippage_bps = u128::from(slippage_bps.min(BASIS_POINT_MAX as u16));
    let min_out = u128::from(out_amount) * (BASIS_POINT_MAX as u128 - slippage_bps)
        / BASIS_POINT_MAX as u128;
    min_out as u64
}

/// 交换方向上从活跃bin数组开始的连续bin数组索引
/// Consecutive bin array indexes starting at the active array, in swap direction.
/// Selling X for Y walks the price down, selling Y for X walks it up.
pub fn get_bin_array_indexes_for_swap(active_id: i32, swap_for_y: bool, count: usize) -> Vec<i64> {
    let start = i64::from(BinArray::bin_id_to_bin_array_index(active_id));
    (0..count as i64)
        .map(|step| if swap_for_y { start - step } else { start + step })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_includes_both_boundaries() {
        assert_eq!(RangeStatus::of(5, 15, 10), RangeStatus::InRange);
        assert_eq!(RangeStatus::of(5, 15, 5), RangeStatus::InRange);
        assert_eq!(RangeStatus::of(5, 15, 15), RangeStatus::InRange);
        assert_eq!(RangeStatus::of(5, 15, 10).label(), "✅ IN RANGE");
    }

    #[test]
    fn out_of_range_reports_distance_to_nearest_boundary() {
        assert_eq!(RangeStatus::of(5, 15, 2), RangeStatus::Below { distance: 3 });
        assert_eq!(RangeStatus::of(5, 15, 16), RangeStatus::Above { distance: 1 });
        assert_eq!(RangeStatus::of(-20, -10, -25), RangeStatus::Below { distance: 5 });
        assert_eq!(RangeStatus::of(5, 15, 16).label(), "❌ OUT OF RANGE");
    }

    #[test]
    fn bin_range_around_active_bin() {
        let range = BinRange::around(8_388, 10).unwrap();
        assert_eq!(range.min_bin_id, 8_378);
        assert_eq!(range.max_bin_id, 8_398);
        assert_eq!(range.width().unwrap(), 21);

        let range = BinRange::around(-5, 10).unwrap();
        assert_eq!(range.bin_array_indexes(), (-1, 0));
    }

    #[test]
    fn bin_range_rejects_too_wide_positions() {
        assert!(BinRange::around(0, 35).unwrap().width().is_err());
        assert_eq!(BinRange::around(0, 34).unwrap().width().unwrap(), 69);
    }

    #[test]
    fn price_from_id() {
        assert_eq!(get_price_per_lamport_from_id(0, 25).unwrap(), Decimal::ONE);
        let price = get_price_per_lamport_from_id(2, 100).unwrap();
        assert_eq!(price, Decimal::new(10201, 4));
        let price = get_price_per_lamport_from_id(-1, 100).unwrap();
        assert!(price < Decimal::ONE);
    }

    #[test]
    fn price_per_token_scales_by_decimals() {
        let price = price_per_lamport_to_price_per_token(Decimal::new(3, 2), 9, 6).unwrap();
        assert_eq!(price, Decimal::from(30));
    }

    #[test]
    fn amount_from_share() {
        assert_eq!(get_amount_from_share(1, 4, 1_000).unwrap(), 250);
        assert_eq!(get_amount_from_share(5, 0, 1_000).unwrap(), 0);
        let supply = 3u128 << 64;
        assert_eq!(get_amount_from_share(1u128 << 64, supply, 100).unwrap(), 33);
        let supply = 4u128 << 100;
        assert_eq!(get_amount_from_share(1u128 << 100, supply, u64::MAX).unwrap(), u64::MAX / 4);
    }

    #[test]
    fn min_out_amount_applies_slippage() {
        assert_eq!(get_min_out_amount(10_000, 10), 9_990);
        assert_eq!(get_min_out_amount(10_000, 100), 9_900);
        assert_eq!(get_min_out_amount(7, 1), 6);
        assert_eq!(get_min_out_amount(500, 20_000), 0);
    }

    #[test]
    fn swap_bin_arrays_follow_price_direction() {
        assert_eq!(get_bin_array_indexes_for_swap(75, false, 3), vec![1, 2, 3]);
        assert_eq!(get_bin_array_indexes_for_swap(75, true, 3), vec![1, 0, -1]);
        assert_eq!(get_bin_array_indexes_for_swap(-1, true, 2), vec![-1, -2]);
    }
}
