/// DLMM 控制台菜单操作
/// 每个菜单项对应一个 execute_* 函数：组装参数、发送交易、输出结果
/// Console menu actions: one `execute_*` per menu entry

// === 流动性管理 / Liquidity Management ===

/// 初始化仓位并添加流动性 / Initialize position and deposit
pub mod initialize_position;
pub use initialize_position::*;

/// 添加流动性指令 / Add liquidity instruction
pub mod add_liquidity;
pub use add_liquidity::*;

/// 移除流动性指令 / Remove liquidity instruction
pub mod remove_liquidity;
pub use remove_liquidity::*;

// === 交易功能 / Trading Functions ===

/// 精确输入交换指令 / Swap exact in instruction
pub mod swap_exact_in;
pub use swap_exact_in::*;

// === 查询和显示 / Query and Display ===

/// 显示仓位 / Display positions
pub mod display_positions;
pub use display_positions::*;

// === 通用工具 / Common Utils ===

/// 通用工具函数 / Common utility functions
mod utils;
pub use utils::*;
