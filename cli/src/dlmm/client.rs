//! DLMM 指令的账户列表与参数
//! Account lists and arguments of the DLMM instructions used by the console.
//!
//! Mirrors the layout of an anchor generated client: `accounts::X` yields the ordered
//! account metas, `args::X` yields the discriminator prefixed instruction data.

use anchor_lang::prelude::{AccountMeta, Pubkey};
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::ToAccountMetas;

/// 组装一条DLMM指令
/// Assemble a DLMM instruction from its accounts, args and remaining accounts
pub fn build_instruction(
    accounts: &impl ToAccountMetas,
    args: &impl args::InstructionArgs,
    remaining_accounts: Vec<AccountMeta>,
) -> std::io::Result<Instruction> {
    Ok(Instruction {
        program_id: super::ID,
        accounts: [accounts.to_account_metas(None), remaining_accounts].concat(),
        data: args.data()?,
    })
}

pub mod accounts {
    use super::*;

    /// 可选账户：缺省时传入程序ID
    /// Optional account; anchor expects the program id in its place when absent
    fn optional(key: Option<Pubkey>, is_writable: bool) -> AccountMeta {
        match key {
            Some(key) if is_writable => AccountMeta::new(key, false),
            Some(key) => AccountMeta::new_readonly(key, false),
            None => AccountMeta::new_readonly(crate::dlmm::ID, false),
        }
    }

    fn event_cpi_accounts(event_authority: Pubkey) -> [AccountMeta; 2] {
        [
            AccountMeta::new_readonly(event_authority, false),
            AccountMeta::new_readonly(crate::dlmm::ID, false),
        ]
    }

    pub struct InitializeBinArray {
        pub lb_pair: Pubkey,
        pub bin_array: Pubkey,
        pub funder: Pubkey,
    }

    impl ToAccountMetas for InitializeBinArray {
        fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
            vec![
                AccountMeta::new_readonly(self.lb_pair, false),
                AccountMeta::new(self.bin_array, false),
                AccountMeta::new(self.funder, true),
                AccountMeta::new_readonly(anchor_lang::system_program::ID, false),
            ]
        }
    }

    pub struct InitializePosition {
        pub payer: Pubkey,
        pub position: Pubkey,
        pub lb_pair: Pubkey,
        pub owner: Pubkey,
        pub event_authority: Pubkey,
    }

    impl ToAccountMetas for InitializePosition {
        fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
            let mut metas = vec![
                AccountMeta::new(self.payer, true),
                AccountMeta::new(self.position, true),
                AccountMeta::new_readonly(self.lb_pair, false),
                AccountMeta::new_readonly(self.owner, true),
                AccountMeta::new_readonly(anchor_lang::system_program::ID, false),
                AccountMeta::new_readonly(anchor_lang::solana_program::sysvar::rent::ID, false),
            ];
            metas.extend(event_cpi_accounts(self.event_authority));
            metas
        }
    }

    /// 按策略添加流动性与按范围移除流动性共用同一组账户
    /// Accounts shared by add-liquidity-by-strategy and remove-liquidity-by-range
    pub struct ModifyLiquidity {
        pub position: Pubkey,
        pub lb_pair: Pubkey,
        pub bin_array_bitmap_extension: Option<Pubkey>,
        pub user_token_x: Pubkey,
        pub user_token_y: Pubkey,
        pub reserve_x: Pubkey,
        pub reserve_y: Pubkey,
        pub token_x_mint: Pubkey,
        pub token_y_mint: Pubkey,
        pub bin_array_lower: Pubkey,
        pub bin_array_upper: Pubkey,
        pub sender: Pubkey,
        pub token_x_program: Pubkey,
        pub token_y_program: Pubkey,
        pub event_authority: Pubkey,
    }

    impl ToAccountMetas for ModifyLiquidity {
        fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
            let mut metas = vec![
                AccountMeta::new(self.position, false),
                AccountMeta::new(self.lb_pair, false),
                optional(self.bin_array_bitmap_extension, true),
                AccountMeta::new(self.user_token_x, false),
                AccountMeta::new(self.user_token_y, false),
                AccountMeta::new(self.reserve_x, false),
                AccountMeta::new(self.reserve_y, false),
                AccountMeta::new_readonly(self.token_x_mint, false),
                AccountMeta::new_readonly(self.token_y_mint, false),
                AccountMeta::new(self.bin_array_lower, false),
                AccountMeta::new(self.bin_array_upper, false),
                AccountMeta::new_readonly(self.sender, true),
                AccountMeta::new_readonly(self.token_x_program, false),
                AccountMeta::new_readonly(self.token_y_program, false),
            ];
            metas.extend(event_cpi_accounts(self.event_authority));
            metas
        }
    }

    pub struct ClaimFee {
        pub lb_pair: Pubkey,
        pub position: Pubkey,
        pub bin_array_lower: Pubkey,
        pub bin_array_upper: Pubkey,
        pub sender: Pubkey,
        pub reserve_x: Pubkey,
        pub reserve_y: Pubkey,
        pub user_token_x: Pubkey,
        pub user_token_y: Pubkey,
        pub token_x_mint: Pubkey,
        pub token_y_mint: Pubkey,
        pub token_program: Pubkey,
        pub event_authority: Pubkey,
    }

    impl ToAccountMetas for ClaimFee {
        fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
            let mut metas = vec![
                AccountMeta::new(self.lb_pair, false),
                AccountMeta::new(self.position, false),
                AccountMeta::new(self.bin_array_lower, false),
                AccountMeta::new(self.bin_array_upper, false),
                AccountMeta::new_readonly(self.sender, true),
                AccountMeta::new(self.reserve_x, false),
                AccountMeta::new(self.reserve_y, false),
                AccountMeta::new(self.user_token_x, false),
                AccountMeta::new(self.user_token_y, false),
                AccountMeta::new_readonly(self.token_x_mint, false),
                AccountMeta::new_readonly(self.token_y_mint, false),
                AccountMeta::new_readonly(self.token_program, false),
            ];
            metas.extend(event_cpi_accounts(self.event_authority));
            metas
        }
    }

    pub struct ClosePosition {
        pub position: Pubkey,
        pub lb_pair: Pubkey,
        pub bin_array_lower: Pubkey,
        pub bin_array_upper: Pubkey,
        pub sender: Pubkey,
        pub rent_receiver: Pubkey,
        pub event_authority: Pubkey,
    }

    impl ToAccountMetas for ClosePosition {
        fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
            let mut metas = vec![
                AccountMeta::new(self.position, false),
                AccountMeta::new(self.lb_pair, false),
                AccountMeta::new(self.bin_array_lower, false),
                AccountMeta::new(self.bin_array_upper, false),
                AccountMeta::new_readonly(self.sender, true),
                AccountMeta::new(self.rent_receiver, false),
            ];
            metas.extend(event_cpi_accounts(self.event_authority));
            metas
        }
    }

    pub struct Swap {
        pub lb_pair: Pubkey,
        pub bin_array_bitmap_extension: Option<Pubkey>,
        pub reserve_x: Pubkey,
        pub reserve_y: Pubkey,
        pub user_token_in: Pubkey,
        pub user_token_out: Pubkey,
        pub token_x_mint: Pubkey,
        pub token_y_mint: Pubkey,
        pub oracle: Pubkey,
        pub host_fee_in: Option<Pubkey>,
        pub user: Pubkey,
        pub token_x_program: Pubkey,
        pub token_y_program: Pubkey,
        pub event_authority: Pubkey,
    }

    impl ToAccountMetas for Swap {
        fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
            let mut metas = vec![
                AccountMeta::new(self.lb_pair, false),
                optional(self.bin_array_bitmap_extension, false),
                AccountMeta::new(self.reserve_x, false),
                AccountMeta::new(self.reserve_y, false),
                AccountMeta::new(self.user_token_in, false),
                AccountMeta::new(self.user_token_out, false),
                AccountMeta::new_readonly(self.token_x_mint, false),
                AccountMeta::new_readonly(self.token_y_mint, false),
                AccountMeta::new(self.oracle, false),
                optional(self.host_fee_in, true),
                AccountMeta::new_readonly(self.user, true),
                AccountMeta::new_readonly(self.token_x_program, false),
                AccountMeta::new_readonly(self.token_y_program, false),
            ];
            metas.extend(event_cpi_accounts(self.event_authority));
            metas
        }
    }
}

pub mod args {
    use borsh::BorshSerialize;

    use crate::dlmm::types::LiquidityParameterByStrategy;

    /// 指令参数：鉴别器 + borsh 编码
    /// Instruction arguments: anchor sighash followed by the borsh body
    pub trait InstructionArgs: BorshSerialize {
        const DISCRIMINATOR: [u8; 8];

        fn data(&self) -> std::io::Result<Vec<u8>> {
            let mut data = Self::DISCRIMINATOR.to_vec();
            self.serialize(&mut data)?;
            Ok(data)
        }
    }

    #[derive(BorshSerialize)]
    pub struct InitializeBinArray {
        pub index: i64,
    }

    impl InstructionArgs for InitializeBinArray {
        const DISCRIMINATOR: [u8; 8] = [35, 86, 19, 185, 78, 212, 75, 211];
    }

    #[derive(BorshSerialize)]
    pub struct InitializePosition {
        pub lower_bin_id: i32,
        pub width: i32,
    }

    impl InstructionArgs for InitializePosition {
        const DISCRIMINATOR: [u8; 8] = [219, 192, 234, 71, 190, 191, 102, 80];
    }

    #[derive(BorshSerialize)]
    pub struct AddLiquidityByStrategy {
        pub liquidity_parameter: LiquidityParameterByStrategy,
    }

    impl InstructionArgs for AddLiquidityByStrategy {
        const DISCRIMINATOR: [u8; 8] = [7, 3, 150, 127, 148, 40, 61, 200];
    }

    #[derive(BorshSerialize)]
    pub struct RemoveLiquidityByRange {
        pub from_bin_id: i32,
        pub to_bin_id: i32,
        pub bps_to_remove: u16,
    }

    impl InstructionArgs for RemoveLiquidityByRange {
        const DISCRIMINATOR: [u8; 8] = [26, 82, 102, 152, 240, 74, 105, 26];
    }

    #[derive(BorshSerialize)]
    pub struct ClaimFee {}

    impl InstructionArgs for ClaimFee {
        const DISCRIMINATOR: [u8; 8] = [169, 32, 79, 137, 136, 232, 70, 137];
    }

    #[derive(BorshSerialize)]
    pub struct ClosePosition {}

    impl InstructionArgs for ClosePosition {
        const DISCRIMINATOR: [u8; 8] = [123, 134, 81, 0, 49, 68, 98, 98];
    }

    #[derive(BorshSerialize)]
    pub struct Swap {
        pub amount_in: u64,
        pub min_amount_out: u64,
    }

    impl InstructionArgs for Swap {
        const DISCRIMINATOR: [u8; 8] = [248, 198, 158, 145, 225, 117, 135, 200];
    }
}

#[cfg(test)]
mod tests {
    use super::args::InstructionArgs;
    use super::*;
    use sha2::{Digest, Sha256};

    fn sighash(name: &str) -> [u8; 8] {
        let hash = Sha256::digest(format!("global:{name}").as_bytes());
        let mut disc = [0u8; 8];
        disc.copy_from_slice(&hash[..8]);
        disc
    }

    #[test]
    fn discriminators_match_anchor_sighash() {
        assert_eq!(args::InitializeBinArray::DISCRIMINATOR, sighash("initialize_bin_array"));
        assert_eq!(args::InitializePosition::DISCRIMINATOR, sighash("initialize_position"));
        assert_eq!(
            args::AddLiquidityByStrategy::DISCRIMINATOR,
            sighash("add_liquidity_by_strategy")
        );
        assert_eq!(
            args::RemoveLiquidityByRange::DISCRIMINATOR,
            sighash("remove_liquidity_by_range")
        );
        assert_eq!(args::ClaimFee::DISCRIMINATOR, sighash("claim_fee"));
        assert_eq!(args::ClosePosition::DISCRIMINATOR, sighash("close_position"));
        assert_eq!(args::Swap::DISCRIMINATOR, sighash("swap"));
    }

    #[test]
    fn initialize_position_instruction() {
        let payer = Pubkey::new_unique();
        let position = Pubkey::new_unique();
        let accounts = accounts::InitializePosition {
            payer,
            position,
            lb_pair: Pubkey::new_unique(),
            owner: payer,
            event_authority: Pubkey::new_unique(),
        };
        let ix = build_instruction(
            &accounts,
            &args::InitializePosition {
                lower_bin_id: -10,
                width: 21,
            },
            vec![],
        )
        .unwrap();

        assert_eq!(ix.program_id, crate::dlmm::ID);
        assert_eq!(ix.accounts.len(), 8);
        assert!(ix.accounts[1].is_signer && ix.accounts[1].is_writable);
        assert_eq!(ix.accounts[1].pubkey, position);
        assert_eq!(ix.data.len(), 16);
        assert_eq!(&ix.data[8..12], &(-10i32).to_le_bytes());
        assert_eq!(&ix.data[12..16], &21i32.to_le_bytes());
    }

    #[test]
    fn swap_fills_absent_optional_accounts_with_program_id() {
        let accounts = accounts::Swap {
            lb_pair: Pubkey::new_unique(),
            bin_array_bitmap_extension: None,
            reserve_x: Pubkey::new_unique(),
            reserve_y: Pubkey::new_unique(),
            user_token_in: Pubkey::new_unique(),
            user_token_out: Pubkey::new_unique(),
            token_x_mint: Pubkey::new_unique(),
            token_y_mint: Pubkey::new_unique(),
            oracle: Pubkey::new_unique(),
            host_fee_in: None,
            user: Pubkey::new_unique(),
            token_x_program: anchor_spl::token::ID,
            token_y_program: anchor_spl::token::ID,
            event_authority: Pubkey::new_unique(),
        };
        let bin_array = Pubkey::new_unique();
        let ix = build_instruction(
            &accounts,
            &args::Swap {
                amount_in: 100,
                min_amount_out: 90,
            },
            vec![AccountMeta::new(bin_array, false)],
        )
        .unwrap();

        assert_eq!(ix.accounts.len(), 16);
        assert_eq!(ix.accounts[1].pubkey, crate::dlmm::ID);
        assert!(!ix.accounts[1].is_writable);
        assert_eq!(ix.accounts[9].pubkey, crate::dlmm::ID);
        assert_eq!(ix.accounts[15].pubkey, bin_array);
        assert_eq!(&ix.data[..8], &sighash("swap"));
        assert_eq!(&ix.data[8..16], &100u64.to_le_bytes());
        assert_eq!(&ix.data[16..24], &90u64.to_le_bytes());
    }

    #[test]
    fn remove_liquidity_by_range_data() {
        let data = args::RemoveLiquidityByRange {
            from_bin_id: -3,
            to_bin_id: 17,
            bps_to_remove: 10_000,
        }
        .data()
        .unwrap();
        assert_eq!(data.len(), 8 + 4 + 4 + 2);
        assert_eq!(&data[16..18], &10_000u16.to_le_bytes());
    }
}
