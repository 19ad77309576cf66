// 导入必要的依赖
use anchor_client::solana_client::rpc_config::RpcSendTransactionConfig;
use anchor_client::solana_sdk::compute_budget::ComputeBudgetInstruction;
use anchor_client::solana_sdk::instruction::Instruction;
use anchor_client::solana_sdk::signature::Signature;
use anchor_client::{
    solana_sdk::pubkey::Pubkey,
    solana_sdk::{
        commitment_config::CommitmentConfig,
        signer::{keypair::Keypair, Signer},
    },
};
use anchor_client::{Client, Program};
use anchor_lang::prelude::AccountMeta;
use anchor_lang::AccountDeserialize;
use anyhow::{bail, Context, Result};
use clap::Parser;
use dlmm::accounts::*;
use dlmm::{derive_bin_array_bitmap_extension, derive_bin_array_pda, derive_event_authority_pda, BASIS_POINT_MAX};
use log::{debug, info, warn};
use std::ops::Deref;
use std::rc::Rc;
use std::sync::Arc;

// 模块声明
mod args; // 命令行参数定义
mod dlmm; // DLMM 程序模型
mod error; // 错误类型
mod instructions; // 菜单操作实现
mod math; // 数学计算工具
mod menu; // 交互式菜单
mod pool; // 流动性池客户端
mod rpc_client_extension;
mod session;
mod wallet;

use args::*;
use error::*;
use instructions::*;
use math::*;
use menu::*;
use pool::*;
use rpc_client_extension::*;
use session::*;

/// 主函数入口
/// 加载配置与钱包，连接流动性池后进入交互式菜单
#[tokio::main]
async fn main() -> Result<()> {
    // .env 文件可选
    dotenvy::dotenv().ok();
    env_logger::init();

    // 解析命令行参数
    let cli = Cli::parse();

    // 读取钱包：优先 PRIVATE_KEY，否则读取密钥对文件
    let payer = wallet::load_payer(
        cli.config_override.private_key.as_deref(),
        &cli.config_override.wallet,
    )?;

    // 打印钱包公钥
    println!("Wallet {:#?}", payer.pubkey());

    // 设置确认级别为confirmed
    // confirmed表示交易已被集群中大多数节点确认
    let commitment_config = CommitmentConfig::confirmed();

    // 创建Anchor客户端，用于与Solana区块链交互
    let client = Client::new_with_options(
        cli.config_override.cluster.clone(),
        Rc::new(payer),
        commitment_config,
    );

    // 获取DLMM程序客户端
    let program = client.program(dlmm::ID)?;

    // 配置交易发送选项
    let transaction_config: RpcSendTransactionConfig = RpcSendTransactionConfig {
        skip_preflight: false,
        preflight_commitment: Some(commitment_config.commitment),
        ..Default::default()
    };

    // 根据用户设置创建计算单元价格指令（优先费用）
    let compute_unit_price_ix = get_set_compute_unit_price_ix(cli.config_override.priority_fee);

    info!(
        "Connecting to pool {} on {}",
        cli.config_override.pool,
        cli.config_override.cluster.url()
    );
    let pool = DlmmPool::create(program, cli.config_override.pool)
        .await
        .with_context(|| format!("failed to load pool {}", cli.config_override.pool))?;

    let mut session = Session::new(
        pool,
        cli.strategy,
        cli.swap,
        transaction_config,
        compute_unit_price_ix,
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_menu(&mut session, cli.config_override.menu, stdin, &mut stdout).await
}
