//! DLMM 链上账户的零拷贝布局
//! Zero-copy layouts of the DLMM on-chain accounts.
//!
//! Every account starts with an 8 byte anchor discriminator followed by a `repr(C)` body,
//! read with `bytemuck::pod_read_unaligned` the same way the program lays it out.

use anchor_lang::prelude::Pubkey;
use bytemuck::{Pod, Zeroable};

use super::MAX_BIN_PER_ARRAY;
use crate::error::DlmmError;

/// 账户布局：带鉴别器的零拷贝账户
/// An on-chain account body that can be decoded from raw account data.
pub trait AccountLayout: Pod {
    const DISCRIMINATOR: [u8; 8];
    const NAME: &'static str;

    /// 校验鉴别器并解码账户数据
    /// Check the discriminator and decode the body that follows it.
    fn from_account_data(data: &[u8]) -> Result<Self, DlmmError> {
        let expected = 8 + std::mem::size_of::<Self>();
        if data.len() < expected {
            return Err(DlmmError::AccountTooShort {
                account: Self::NAME,
                expected,
                actual: data.len(),
            });
        }
        if data[..8] != Self::DISCRIMINATOR {
            return Err(DlmmError::InvalidDiscriminator(Self::NAME));
        }
        Ok(bytemuck::pod_read_unaligned(&data[8..expected]))
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct StaticParameters {
    pub base_factor: u16,
    pub filter_period: u16,
    pub decay_period: u16,
    pub reduction_factor: u16,
    pub variable_fee_control: u32,
    pub max_volatility_accumulator: u32,
    pub min_bin_id: i32,
    pub max_bin_id: i32,
    pub protocol_share: u16,
    pub base_fee_power_factor: u8,
    pub _padding: [u8; 5],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct VariableParameters {
    pub volatility_accumulator: u32,
    pub volatility_reference: u32,
    pub index_reference: i32,
    pub _padding: [u8; 4],
    pub last_update_timestamp: i64,
    pub _padding_1: [u8; 8],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ProtocolFee {
    pub amount_x: u64,
    pub amount_y: u64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct RewardInfo {
    pub mint: Pubkey,
    pub vault: Pubkey,
    pub funder: Pubkey,
    pub reward_duration: u64,
    pub reward_duration_end: u64,
    pub reward_rate: u128,
    pub last_update_time: u64,
    pub cumulative_seconds_with_empty_liquidity_reward: u64,
}

/// 流动性交易对账户
/// Liquidity pair (pool) account
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LbPair {
    pub parameters: StaticParameters,
    pub v_parameters: VariableParameters,
    pub bump_seed: [u8; 1],
    pub bin_step_seed: [u8; 2],
    pub pair_type: u8,
    /// 当前活跃bin ID / Bin holding the current price
    pub active_id: i32,
    /// bin步长（基点）/ Price step between bins, in bps
    pub bin_step: u16,
    pub status: u8,
    pub require_base_factor_seed: u8,
    pub base_factor_seed: [u8; 2],
    pub activation_type: u8,
    pub creator_pool_on_off_control: u8,
    pub token_x_mint: Pubkey,
    pub token_y_mint: Pubkey,
    pub reserve_x: Pubkey,
    pub reserve_y: Pubkey,
    pub protocol_fee: ProtocolFee,
    pub _padding_1: [u8; 32],
    pub reward_infos: [RewardInfo; 2],
    pub oracle: Pubkey,
    pub bin_array_bitmap: [u64; 16],
    pub last_updated_at: i64,
    pub _padding_2: [u8; 32],
    pub pre_activation_swap_address: Pubkey,
    pub base_key: Pubkey,
    pub activation_point: u64,
    pub pre_activation_duration: u64,
    pub _padding_3: [u8; 8],
    pub _padding_4: u64,
    pub creator: Pubkey,
    pub token_mint_x_program_flag: u8,
    pub token_mint_y_program_flag: u8,
    pub _reserved: [u8; 22],
}

impl AccountLayout for LbPair {
    const DISCRIMINATOR: [u8; 8] = [33, 11, 49, 98, 181, 101, 177, 13];
    const NAME: &'static str = "LbPair";
}

impl LbPair {
    /// 获取X和Y代币所属的代币程序（Token 或 Token2022）
    /// Token programs owning mint X and mint Y
    pub fn get_token_programs(&self) -> Result<[Pubkey; 2], DlmmError> {
        Ok([
            token_program_from_flag(self.token_mint_x_program_flag)?,
            token_program_from_flag(self.token_mint_y_program_flag)?,
        ])
    }
}

fn token_program_from_flag(flag: u8) -> Result<Pubkey, DlmmError> {
    match flag {
        0 => Ok(anchor_spl::token::ID),
        1 => Ok(anchor_spl::token_2022::ID),
        other => Err(DlmmError::UnknownTokenProgramFlag(other)),
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct UserRewardInfo {
    pub reward_per_token_completes: [u128; 2],
    pub reward_pendings: [u64; 2],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FeeInfo {
    pub fee_x_per_token_complete: u128,
    pub fee_y_per_token_complete: u128,
    pub fee_x_pending: u64,
    pub fee_y_pending: u64,
}

/// 流动性仓位账户（第二版）
/// Liquidity position account (v2)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PositionV2 {
    pub lb_pair: Pubkey,
    pub owner: Pubkey,
    /// 每个bin的流动性份额 / Liquidity share per bin, indexed from `lower_bin_id`
    pub liquidity_shares: [u128; MAX_BIN_PER_ARRAY],
    pub reward_infos: [UserRewardInfo; MAX_BIN_PER_ARRAY],
    pub fee_infos: [FeeInfo; MAX_BIN_PER_ARRAY],
    pub lower_bin_id: i32,
    pub upper_bin_id: i32,
    pub last_updated_at: i64,
    pub total_claimed_fee_x_amount: u64,
    pub total_claimed_fee_y_amount: u64,
    pub total_claimed_rewards: [u64; 2],
    pub operator: Pubkey,
    pub lock_release_point: u64,
    pub _padding_0: u8,
    pub fee_owner: Pubkey,
    pub _reserved: [u8; 87],
}

impl AccountLayout for PositionV2 {
    const DISCRIMINATOR: [u8; 8] = [117, 176, 212, 199, 245, 180, 133, 182];
    const NAME: &'static str = "PositionV2";
}

impl PositionV2 {
    /// 仓位在账户数据中 lb_pair 字段的偏移（含鉴别器）
    pub const LB_PAIR_OFFSET: usize = 8;
    /// 仓位在账户数据中 owner 字段的偏移（含鉴别器）
    pub const OWNER_OFFSET: usize = 8 + 32;

    pub fn bin_ids(&self) -> std::ops::RangeInclusive<i32> {
        self.lower_bin_id..=self.upper_bin_id
    }

    /// 获取指定bin的流动性份额
    /// Liquidity share the position owns in `bin_id`
    pub fn get_liquidity_share(&self, bin_id: i32) -> Result<u128, DlmmError> {
        let idx = bin_id
            .checked_sub(self.lower_bin_id)
            .filter(|idx| (0..MAX_BIN_PER_ARRAY as i32).contains(idx) && bin_id <= self.upper_bin_id)
            .ok_or(DlmmError::BinOutOfPosition {
                bin_id,
                lower_bin_id: self.lower_bin_id,
                upper_bin_id: self.upper_bin_id,
            })?;
        Ok(self.liquidity_shares[idx as usize])
    }

    /// 覆盖该仓位的bin数组索引（下界、上界）
    /// Indexes of the bin arrays holding the lower and upper bins
    pub fn get_bin_array_indexes_coverage(&self) -> (i32, i32) {
        (
            BinArray::bin_id_to_bin_array_index(self.lower_bin_id),
            BinArray::bin_id_to_bin_array_index(self.upper_bin_id),
        )
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Bin {
    pub amount_x: u64,
    pub amount_y: u64,
    pub price: u128,
    pub liquidity_supply: u128,
    pub reward_per_token_stored: [u128; 2],
    pub fee_amount_x_per_token_stored: u128,
    pub fee_amount_y_per_token_stored: u128,
    pub amount_x_in: u128,
    pub amount_y_in: u128,
}

/// bin数组账户，每个包含70个连续的bin
/// Bin array account holding 70 consecutive bins
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct BinArray {
    pub index: i64,
    pub version: u8,
    pub _padding: [u8; 7],
    pub lb_pair: Pubkey,
    pub bins: [Bin; MAX_BIN_PER_ARRAY],
}

impl AccountLayout for BinArray {
    const DISCRIMINATOR: [u8; 8] = [92, 142, 92, 220, 5, 148, 70, 181];
    const NAME: &'static str = "BinArray";
}

impl BinArray {
    /// bin ID 所在的bin数组索引（向下取整）
    /// Index of the bin array that holds `bin_id`, rounding toward negative infinity
    pub fn bin_id_to_bin_array_index(bin_id: i32) -> i32 {
        bin_id.div_euclid(MAX_BIN_PER_ARRAY as i32)
    }

    /// bin数组覆盖的最小和最大bin ID
    /// Lower and upper bin id covered by the array at `index`
    pub fn get_bin_array_lower_upper_bin_id(index: i32) -> Result<(i32, i32), DlmmError> {
        let lower_bin_id = index
            .checked_mul(MAX_BIN_PER_ARRAY as i32)
            .ok_or(DlmmError::MathOverflow)?;
        let upper_bin_id = lower_bin_id
            .checked_add(MAX_BIN_PER_ARRAY as i32 - 1)
            .ok_or(DlmmError::MathOverflow)?;
        Ok((lower_bin_id, upper_bin_id))
    }

    pub fn get_bin(&self, bin_id: i32) -> Result<&Bin, DlmmError> {
        let (lower_bin_id, upper_bin_id) =
            Self::get_bin_array_lower_upper_bin_id(self.index as i32)?;
        if bin_id < lower_bin_id || bin_id > upper_bin_id {
            return Err(DlmmError::BinOutOfArray {
                bin_id,
                index: self.index,
            });
        }
        Ok(&self.bins[(bin_id - lower_bin_id) as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};

    fn account_discriminator(name: &str) -> [u8; 8] {
        let hash = Sha256::digest(format!("account:{name}").as_bytes());
        let mut disc = [0u8; 8];
        disc.copy_from_slice(&hash[..8]);
        disc
    }

    #[test]
    fn layouts_match_program_sizes() {
        assert_eq!(std::mem::size_of::<LbPair>(), 896);
        assert_eq!(std::mem::size_of::<PositionV2>(), 8112);
        assert_eq!(std::mem::size_of::<BinArray>(), 10128);
    }

    #[test]
    fn discriminators_match_anchor_hash() {
        assert_eq!(LbPair::DISCRIMINATOR, account_discriminator("LbPair"));
        assert_eq!(PositionV2::DISCRIMINATOR, account_discriminator("PositionV2"));
        assert_eq!(BinArray::DISCRIMINATOR, account_discriminator("BinArray"));
    }

    #[test]
    fn active_id_is_read_at_program_offset() {
        let mut data = vec![0u8; 8 + std::mem::size_of::<LbPair>()];
        data[..8].copy_from_slice(&LbPair::DISCRIMINATOR);
        data[76..80].copy_from_slice(&(-1234i32).to_le_bytes());
        data[80..82].copy_from_slice(&25u16.to_le_bytes());

        let lb_pair = LbPair::from_account_data(&data).unwrap();
        assert_eq!(lb_pair.active_id, -1234);
        assert_eq!(lb_pair.bin_step, 25);
    }

    #[test]
    fn rejects_wrong_discriminator_and_short_data() {
        let mut data = vec![0u8; 8 + std::mem::size_of::<LbPair>()];
        data[..8].copy_from_slice(&BinArray::DISCRIMINATOR);
        assert!(matches!(
            LbPair::from_account_data(&data),
            Err(DlmmError::InvalidDiscriminator("LbPair"))
        ));
        assert!(matches!(
            LbPair::from_account_data(&data[..100]),
            Err(DlmmError::AccountTooShort { actual: 100, .. })
        ));
    }

    #[test]
    fn token_programs_follow_flags() {
        let mut lb_pair = LbPair::zeroed();
        lb_pair.token_mint_y_program_flag = 1;
        assert_eq!(
            lb_pair.get_token_programs().unwrap(),
            [anchor_spl::token::ID, anchor_spl::token_2022::ID]
        );
        lb_pair.token_mint_x_program_flag = 7;
        assert!(lb_pair.get_token_programs().is_err());
    }

    #[test]
    fn bin_array_index_rounds_down_for_negative_ids() {
        assert_eq!(BinArray::bin_id_to_bin_array_index(0), 0);
        assert_eq!(BinArray::bin_id_to_bin_array_index(69), 0);
        assert_eq!(BinArray::bin_id_to_bin_array_index(70), 1);
        assert_eq!(BinArray::bin_id_to_bin_array_index(-1), -1);
        assert_eq!(BinArray::bin_id_to_bin_array_index(-70), -1);
        assert_eq!(BinArray::bin_id_to_bin_array_index(-71), -2);
        assert_eq!(BinArray::get_bin_array_lower_upper_bin_id(-1).unwrap(), (-70, -1));
    }

    #[test]
    fn get_bin_checks_array_bounds() {
        let mut bin_array = BinArray::zeroed();
        bin_array.index = -1;
        bin_array.bins[69].amount_x = 42;
        assert_eq!(bin_array.get_bin(-1).unwrap().amount_x, 42);
        assert!(bin_array.get_bin(0).is_err());
    }

    #[test]
    fn position_share_lookup_is_relative_to_lower_bin() {
        let mut position = PositionV2::zeroed();
        position.lower_bin_id = 100;
        position.upper_bin_id = 120;
        position.liquidity_shares[5] = 777;
        assert_eq!(position.get_liquidity_share(105).unwrap(), 777);
        assert!(position.get_liquidity_share(99).is_err());
        assert!(position.get_liquidity_share(121).is_err());
        assert_eq!(position.get_bin_array_indexes_coverage(), (1, 1));
    }
}
