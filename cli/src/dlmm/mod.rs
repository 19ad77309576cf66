//! DLMM 程序模型：程序ID、常量、PDA派生、账户布局与指令构建
//! DLMM program model: program id, constants, PDA derivation, account layouts and instruction builders

use anchor_lang::prelude::Pubkey;

pub mod accounts;
pub mod client;
pub mod types;

anchor_lang::declare_id!("LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo");

/// 每个bin数组包含的bin数量
/// Number of bins held by one bin array account
pub const MAX_BIN_PER_ARRAY: usize = 70;

/// 基点上限（100%）
/// Basis point maximum (100%)
pub const BASIS_POINT_MAX: i32 = 10_000;

/// Q64.64 定点数的小数位
pub const SCALE_OFFSET: u8 = 64;

/// 一个仓位允许的最大宽度
/// Maximum width of a single position
pub const MAX_POSITION_WIDTH: i32 = 70;

pub const BIN_ARRAY: &[u8] = b"bin_array";
pub const BIN_ARRAY_BITMAP_SEED: &[u8] = b"bitmap";
pub const EVENT_AUTHORITY_SEED: &[u8] = b"__event_authority";

/// 派生bin数组PDA
/// Derive the bin array PDA for the given pair and array index
pub fn derive_bin_array_pda(lb_pair: Pubkey, bin_array_index: i64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[BIN_ARRAY, lb_pair.as_ref(), &bin_array_index.to_le_bytes()],
        &ID,
    )
}

/// 派生bin数组位图扩展PDA
/// Derive the bin array bitmap extension PDA
pub fn derive_bin_array_bitmap_extension(lb_pair: Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[BIN_ARRAY_BITMAP_SEED, lb_pair.as_ref()], &ID)
}

/// 派生事件权限PDA
/// Derive the event authority PDA used by every emitting instruction
pub fn derive_event_authority_pda() -> (Pubkey, u8) {
    Pubkey::find_program_address(&[EVENT_AUTHORITY_SEED], &ID)
}
