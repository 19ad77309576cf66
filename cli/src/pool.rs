//! DLMM 流动性池客户端
//! DLMM pool client: reads pool and position state and assembles the instruction lists for
//! opening, funding, draining and swapping. Distribution and routing math stay on-chain.

use std::collections::{BTreeSet, HashMap};

use anchor_client::solana_account_decoder::UiAccountEncoding;
use anchor_client::solana_client::rpc_config::{
    RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSimulateTransactionAccountsConfig,
    RpcSimulateTransactionConfig,
};
use anchor_client::solana_client::rpc_filter::{Memcmp, RpcFilterType};
use anchor_client::solana_sdk::{account::Account, message::Message, transaction::Transaction};
use anchor_spl::associated_token::get_associated_token_address_with_program_id;
use anchor_spl::associated_token::spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use anchor_spl::token_interface::{Mint, TokenAccount};
use log::{debug, info, warn};
use rust_decimal::Decimal;

use crate::dlmm::client::{accounts, args, build_instruction};
use crate::dlmm::types::{LiquidityParameterByStrategy, StrategyParameters};
use crate::*;

/// 添加流动性时允许活跃bin移动的最大数量
/// Active bin drift tolerated between quoting and landing a deposit
pub const MAX_ACTIVE_BIN_SLIPPAGE: i32 = 3;

/// 代币信息
#[derive(Debug, Clone, Copy)]
pub struct TokenInfo {
    pub public_key: Pubkey,
    pub program: Pubkey,
    pub decimals: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct ActiveBin {
    pub bin_id: i32,
    pub price_per_lamport: Decimal,
    pub price_per_token: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionBinData {
    pub bin_id: i32,
    pub position_liquidity: u128,
    pub position_x_amount: u64,
    pub position_y_amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionData {
    pub lower_bin_id: i32,
    pub upper_bin_id: i32,
    pub total_x_amount: u64,
    pub total_y_amount: u64,
    pub fee_owner: Pubkey,
    pub position_bin_data: Vec<PositionBinData>,
}

impl PositionData {
    /// 根据仓位份额和bin数组计算每个bin中的代币数量
    /// Per-bin token amounts owned by `position`; bins of a missing array hold nothing
    pub fn new(position: &PositionV2, bin_arrays: &HashMap<i64, BinArray>) -> Result<Self> {
        let mut position_bin_data = Vec::with_capacity(position.bin_ids().count());
        let mut total_x_amount = 0u64;
        let mut total_y_amount = 0u64;

        for bin_id in position.bin_ids() {
            let position_liquidity = position.get_liquidity_share(bin_id)?;
            let bin_array_index = i64::from(BinArray::bin_id_to_bin_array_index(bin_id));

            let (position_x_amount, position_y_amount) = match bin_arrays.get(&bin_array_index) {
                Some(bin_array) => {
                    let bin = bin_array.get_bin(bin_id)?;
                    (
                        get_amount_from_share(position_liquidity, bin.liquidity_supply, bin.amount_x)?,
                        get_amount_from_share(position_liquidity, bin.liquidity_supply, bin.amount_y)?,
                    )
                }
                None => (0, 0),
            };

            total_x_amount = total_x_amount
                .checked_add(position_x_amount)
                .context("total x amount overflow")?;
            total_y_amount = total_y_amount
                .checked_add(position_y_amount)
                .context("total y amount overflow")?;

            position_bin_data.push(PositionBinData {
                bin_id,
                position_liquidity,
                position_x_amount,
                position_y_amount,
            });
        }

        Ok(Self {
            lower_bin_id: position.lower_bin_id,
            upper_bin_id: position.upper_bin_id,
            total_x_amount,
            total_y_amount,
            fee_owner: position.fee_owner,
            position_bin_data,
        })
    }
}

#[derive(Debug, Clone)]
pub struct LbPosition {
    pub public_key: Pubkey,
    pub position_data: PositionData,
}

#[derive(Debug, Clone)]
pub struct UserPositions {
    pub active_bin: ActiveBin,
    pub user_positions: Vec<LbPosition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapQuote {
    pub consumed_in_amount: u64,
    pub out_amount: u64,
    pub min_out_amount: u64,
    pub bin_arrays_pubkey: Vec<Pubkey>,
}

/// 按钱包和交易对过滤仓位账户
/// getProgramAccounts filters selecting the PositionV2 accounts of `owner` in `lb_pair`
pub fn position_filter_by_wallet_and_pair(owner: Pubkey, lb_pair: Pubkey) -> Vec<RpcFilterType> {
    vec![
        RpcFilterType::Memcmp(Memcmp::new_base58_encoded(0, &PositionV2::DISCRIMINATOR)),
        RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
            PositionV2::LB_PAIR_OFFSET,
            &lb_pair.to_bytes(),
        )),
        RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
            PositionV2::OWNER_OFFSET,
            &owner.to_bytes(),
        )),
    ]
}

fn token_account_amount(data: &[u8]) -> Result<u64> {
    let token_account = TokenAccount::try_deserialize(&mut &data[..])?;
    Ok(token_account.amount)
}

pub struct DlmmPool<C> {
    program: Program<C>,
    pub pubkey: Pubkey,
    pub lb_pair: LbPair,
    pub token_x: TokenInfo,
    pub token_y: TokenInfo,
    bin_array_bitmap_extension: Option<Pubkey>,
}

impl<C: Deref<Target = impl Signer> + Clone> DlmmPool<C> {
    /// 加载流动性池：交易对状态、代币精度与代币程序
    /// Load the pool: pair state, mint decimals and owning token programs
    pub async fn create(program: Program<C>, pool_address: Pubkey) -> Result<Self> {
        let rpc_client = program.rpc();

        let lb_pair: LbPair = rpc_client.get_dlmm_account(&pool_address).await?;
        let [token_x_program, token_y_program] = lb_pair.get_token_programs()?;
        let (bitmap_extension_key, _bump) = derive_bin_array_bitmap_extension(pool_address);

        let mut accounts = rpc_client
            .get_multiple_accounts(&[
                lb_pair.token_x_mint,
                lb_pair.token_y_mint,
                bitmap_extension_key,
            ])
            .await?;

        let token_x_account = accounts[0].take().context("token_x_mint not found")?;
        let token_y_account = accounts[1].take().context("token_y_mint not found")?;
        let bin_array_bitmap_extension = accounts[2].take().map(|_| bitmap_extension_key);

        let x_mint = Mint::try_deserialize(&mut token_x_account.data.as_ref())?;
        let y_mint = Mint::try_deserialize(&mut token_y_account.data.as_ref())?;

        info!(
            "Loaded pool {pool_address}: active bin {}, bin step {}",
            lb_pair.active_id, lb_pair.bin_step
        );

        Ok(Self {
            program,
            pubkey: pool_address,
            lb_pair,
            token_x: TokenInfo {
                public_key: lb_pair.token_x_mint,
                program: token_x_program,
                decimals: x_mint.decimals,
            },
            token_y: TokenInfo {
                public_key: lb_pair.token_y_mint,
                program: token_y_program,
                decimals: y_mint.decimals,
            },
            bin_array_bitmap_extension,
        })
    }

    pub fn program(&self) -> &Program<C> {
        &self.program
    }

    /// 重新获取交易对状态（活跃bin随交易变化）
    /// Re-read the pair so the active bin reflects the latest trades
    pub async fn refetch_states(&mut self) -> Result<()> {
        self.lb_pair = self.program.rpc().get_dlmm_account(&self.pubkey).await?;
        debug!("Refetched pool {}: active bin {}", self.pubkey, self.lb_pair.active_id);
        Ok(())
    }

    pub fn get_active_bin(&self) -> Result<ActiveBin> {
        let bin_id = self.lb_pair.active_id;
        let price_per_lamport = get_price_per_lamport_from_id(bin_id, self.lb_pair.bin_step)
            .context("active bin price overflow")?;
        let price_per_token = price_per_lamport_to_price_per_token(
            price_per_lamport,
            self.token_x.decimals,
            self.token_y.decimals,
        )
        .context("price_per_lamport_to_price_per_token overflow")?;

        Ok(ActiveBin {
            bin_id,
            price_per_lamport,
            price_per_token,
        })
    }

    /// 获取用户在该交易对中的所有仓位
    /// All positions `user` holds in this pair, with per-bin amounts
    pub async fn get_positions_by_user_and_lb_pair(&self, user: Pubkey) -> Result<UserPositions> {
        let rpc_client = self.program.rpc();

        let config = RpcProgramAccountsConfig {
            filters: Some(position_filter_by_wallet_and_pair(user, self.pubkey)),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                ..Default::default()
            },
            ..Default::default()
        };

        let mut positions = rpc_client
            .get_program_accounts_with_config(&dlmm::ID, config)
            .await?
            .into_iter()
            .map(|(key, account)| Ok((key, PositionV2::from_account_data(&account.data)?)))
            .collect::<Result<Vec<_>>>()?;
        positions.sort_by_key(|(_, position)| position.lower_bin_id);

        let bin_array_indexes = positions
            .iter()
            .flat_map(|(_, position)| {
                let (lower, upper) = position.get_bin_array_indexes_coverage();
                (lower..=upper).map(i64::from)
            })
            .collect::<BTreeSet<_>>();

        let bin_array_keys = bin_array_indexes
            .iter()
            .map(|index| derive_bin_array_pda(self.pubkey, *index).0)
            .collect::<Vec<_>>();

        let bin_arrays = bin_array_indexes
            .into_iter()
            .zip(rpc_client.get_multiple_dlmm_accounts::<BinArray>(&bin_array_keys).await?)
            .filter_map(|(index, bin_array)| bin_array.map(|bin_array| (index, bin_array)))
            .collect::<HashMap<_, _>>();

        debug!(
            "Found {} position(s) of {user} covering {} bin array(s)",
            positions.len(),
            bin_arrays.len()
        );

        let user_positions = positions
            .into_iter()
            .map(|(public_key, position)| {
                Ok(LbPosition {
                    public_key,
                    position_data: PositionData::new(&position, &bin_arrays)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(UserPositions {
            active_bin: self.get_active_bin()?,
            user_positions,
        })
    }

    fn user_token_account(&self, owner: Pubkey, token: &TokenInfo) -> Pubkey {
        get_associated_token_address_with_program_id(&owner, &token.public_key, &token.program)
    }

    fn create_user_token_account_ix(&self, owner: Pubkey, token: &TokenInfo) -> Instruction {
        create_associated_token_account_idempotent(
            &owner,
            &owner,
            &token.public_key,
            &token.program,
        )
    }

    fn bin_array_pair(&self, min_bin_id: i32, max_bin_id: i32) -> (Pubkey, Pubkey) {
        let lower_index = BinArray::bin_id_to_bin_array_index(min_bin_id);
        let upper_index = BinArray::bin_id_to_bin_array_index(max_bin_id);
        (
            derive_bin_array_pda(self.pubkey, lower_index.into()).0,
            derive_bin_array_pda(self.pubkey, upper_index.into()).0,
        )
    }

    /// 为区间内尚未初始化的bin数组生成初始化指令
    /// Initialize instructions for the bin arrays of `range` that do not exist yet
    async fn get_initialize_bin_arrays_ixs(
        &self,
        range: BinRange,
        funder: Pubkey,
    ) -> Result<Vec<Instruction>> {
        let (lower_index, upper_index) = range.bin_array_indexes();
        let indexes = (lower_index..=upper_index).map(i64::from).collect::<Vec<_>>();
        let keys = indexes
            .iter()
            .map(|index| derive_bin_array_pda(self.pubkey, *index).0)
            .collect::<Vec<_>>();

        let existing = self.program.rpc().get_multiple_accounts(&keys).await?;

        let mut ixs = vec![];
        for ((index, bin_array), account) in indexes.into_iter().zip(keys).zip(existing) {
            if account.is_some() {
                continue;
            }
            debug!("Bin array {index} ({bin_array}) missing, initializing");
            ixs.push(build_instruction(
                &accounts::InitializeBinArray {
                    lb_pair: self.pubkey,
                    bin_array,
                    funder,
                },
                &args::InitializeBinArray { index },
                vec![],
            )?);
        }
        Ok(ixs)
    }

    fn add_liquidity_by_strategy_ix(
        &self,
        position: Pubkey,
        user: Pubkey,
        total_x_amount: u64,
        total_y_amount: u64,
        strategy: StrategyParameters,
    ) -> Result<Instruction> {
        let (bin_array_lower, bin_array_upper) =
            self.bin_array_pair(strategy.min_bin_id, strategy.max_bin_id);
        let (event_authority, _bump) = derive_event_authority_pda();

        let main_accounts = accounts::ModifyLiquidity {
            position,
            lb_pair: self.pubkey,
            bin_array_bitmap_extension: self.bin_array_bitmap_extension,
            user_token_x: self.user_token_account(user, &self.token_x),
            user_token_y: self.user_token_account(user, &self.token_y),
            reserve_x: self.lb_pair.reserve_x,
            reserve_y: self.lb_pair.reserve_y,
            token_x_mint: self.token_x.public_key,
            token_y_mint: self.token_y.public_key,
            bin_array_lower,
            bin_array_upper,
            sender: user,
            token_x_program: self.token_x.program,
            token_y_program: self.token_y.program,
            event_authority,
        };

        let data = args::AddLiquidityByStrategy {
            liquidity_parameter: LiquidityParameterByStrategy {
                amount_x: total_x_amount,
                amount_y: total_y_amount,
                active_id: self.lb_pair.active_id,
                max_active_bin_slippage: MAX_ACTIVE_BIN_SLIPPAGE,
                strategy_parameters: strategy,
            },
        };

        Ok(build_instruction(&main_accounts, &data, vec![])?)
    }

    /// 创建仓位并按策略添加流动性
    /// Open `position` over the strategy's bin range and deposit into it
    pub async fn initialize_position_and_add_liquidity_by_strategy(
        &self,
        position: Pubkey,
        user: Pubkey,
        total_x_amount: u64,
        total_y_amount: u64,
        strategy: StrategyParameters,
    ) -> Result<Vec<Instruction>> {
        let range = BinRange {
            min_bin_id: strategy.min_bin_id,
            max_bin_id: strategy.max_bin_id,
        };
        let width = range.width()?;
        let (event_authority, _bump) = derive_event_authority_pda();

        let mut ixs = self.get_initialize_bin_arrays_ixs(range, user).await?;

        ixs.push(build_instruction(
            &accounts::InitializePosition {
                payer: user,
                position,
                lb_pair: self.pubkey,
                owner: user,
                event_authority,
            },
            &args::InitializePosition {
                lower_bin_id: range.min_bin_id,
                width,
            },
            vec![],
        )?);

        ixs.push(self.create_user_token_account_ix(user, &self.token_x));
        ixs.push(self.create_user_token_account_ix(user, &self.token_y));
        ixs.push(self.add_liquidity_by_strategy_ix(
            position,
            user,
            total_x_amount,
            total_y_amount,
            strategy,
        )?);

        Ok(ixs)
    }

    /// 按策略向已有仓位添加流动性
    /// Deposit into an existing position following the given strategy
    pub async fn add_liquidity_by_strategy(
        &self,
        position: Pubkey,
        user: Pubkey,
        total_x_amount: u64,
        total_y_amount: u64,
        strategy: StrategyParameters,
    ) -> Result<Vec<Instruction>> {
        let range = BinRange {
            min_bin_id: strategy.min_bin_id,
            max_bin_id: strategy.max_bin_id,
        };
        range.width()?;

        let mut ixs = self.get_initialize_bin_arrays_ixs(range, user).await?;
        ixs.push(self.create_user_token_account_ix(user, &self.token_x));
        ixs.push(self.create_user_token_account_ix(user, &self.token_y));
        ixs.push(self.add_liquidity_by_strategy_ix(
            position,
            user,
            total_x_amount,
            total_y_amount,
            strategy,
        )?);

        Ok(ixs)
    }

    /// 移除仓位在 [from_bin_id, to_bin_id] 区间的流动性，可选领取手续费并关闭仓位
    /// Withdraw `bps` of the position's share over `[from_bin_id, to_bin_id]`, optionally
    /// claiming fees and closing the position. Claim-and-close is skipped when mint X and
    /// mint Y belong to different token programs. Each inner list is one transaction.
    pub fn remove_liquidity(
        &self,
        position: Pubkey,
        user: Pubkey,
        from_bin_id: i32,
        to_bin_id: i32,
        bps: u16,
        should_claim_and_close: bool,
    ) -> Result<Vec<Vec<Instruction>>> {
        let (bin_array_lower, bin_array_upper) = self.bin_array_pair(from_bin_id, to_bin_id);
        let (event_authority, _bump) = derive_event_authority_pda();
        let user_token_x = self.user_token_account(user, &self.token_x);
        let user_token_y = self.user_token_account(user, &self.token_y);

        let mut ixs = vec![
            self.create_user_token_account_ix(user, &self.token_x),
            self.create_user_token_account_ix(user, &self.token_y),
        ];

        ixs.push(build_instruction(
            &accounts::ModifyLiquidity {
                position,
                lb_pair: self.pubkey,
                bin_array_bitmap_extension: self.bin_array_bitmap_extension,
                user_token_x,
                user_token_y,
                reserve_x: self.lb_pair.reserve_x,
                reserve_y: self.lb_pair.reserve_y,
                token_x_mint: self.token_x.public_key,
                token_y_mint: self.token_y.public_key,
                bin_array_lower,
                bin_array_upper,
                sender: user,
                token_x_program: self.token_x.program,
                token_y_program: self.token_y.program,
                event_authority,
            },
            &args::RemoveLiquidityByRange {
                from_bin_id,
                to_bin_id,
                bps_to_remove: bps,
            },
            vec![],
        )?);

        // claim_fee 只接受一个代币程序 / claim_fee takes a single token program
        let claim_and_close =
            should_claim_and_close && self.token_x.program == self.token_y.program;
        if should_claim_and_close && !claim_and_close {
            warn!(
                "Pool {} mixes token programs, leaving position {position} open after removal",
                self.pubkey
            );
        }

        if claim_and_close {
            ixs.push(build_instruction(
                &accounts::ClaimFee {
                    lb_pair: self.pubkey,
                    position,
                    bin_array_lower,
                    bin_array_upper,
                    sender: user,
                    reserve_x: self.lb_pair.reserve_x,
                    reserve_y: self.lb_pair.reserve_y,
                    user_token_x,
                    user_token_y,
                    token_x_mint: self.token_x.public_key,
                    token_y_mint: self.token_y.public_key,
                    token_program: self.token_x.program,
                    event_authority,
                },
                &args::ClaimFee {},
                vec![],
            )?);

            ixs.push(build_instruction(
                &accounts::ClosePosition {
                    position,
                    lb_pair: self.pubkey,
                    bin_array_lower,
                    bin_array_upper,
                    sender: user,
                    rent_receiver: user,
                    event_authority,
                },
                &args::ClosePosition {},
                vec![],
            )?);
        }

        Ok(vec![ixs])
    }

    /// 获取交换所需的bin数组，遇到第一个未初始化的数组即停止
    /// Bin arrays the swap walks through, stopping at the first uninitialized one
    pub async fn get_bin_array_for_swap(&self, swap_for_y: bool, count: usize) -> Result<Vec<Pubkey>> {
        let keys = get_bin_array_indexes_for_swap(self.lb_pair.active_id, swap_for_y, count)
            .into_iter()
            .map(|index| derive_bin_array_pda(self.pubkey, index).0)
            .collect::<Vec<_>>();

        let existing = self.program.rpc().get_multiple_accounts(&keys).await?;

        let bin_arrays = keys
            .into_iter()
            .zip(existing)
            .take_while(|(_, account)| account.is_some())
            .map(|(key, _)| key)
            .collect::<Vec<_>>();

        if bin_arrays.is_empty() {
            return Err(DlmmError::NoBinArrayForSwap {
                active_id: self.lb_pair.active_id,
            }
            .into());
        }
        Ok(bin_arrays)
    }

    /// 通过模拟交换获取报价
    /// Quote a swap by simulating it against the current chain state
    pub async fn swap_quote(
        &self,
        in_amount: u64,
        swap_for_y: bool,
        slippage_bps: u16,
        bin_arrays: &[Pubkey],
    ) -> Result<SwapQuote> {
        let user = self.program.payer();
        let (in_token, out_token) = if swap_for_y {
            (self.token_x, self.token_y)
        } else {
            (self.token_y, self.token_x)
        };
        let user_token_out = self.user_token_account(user, &out_token);

        let ixs = self.swap(
            in_token.public_key,
            out_token.public_key,
            in_amount,
            0,
            user,
            bin_arrays,
        )?;

        let rpc_client = self.program.rpc();

        let pre_balance = match rpc_client
            .get_multiple_accounts(&[user_token_out])
            .await?
            .pop()
            .flatten()
        {
            Some(account) => token_account_amount(&account.data)?,
            None => 0,
        };

        let transaction = Transaction::new_unsigned(Message::new(&ixs, Some(&user)));
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: true,
            commitment: Some(rpc_client.commitment()),
            accounts: Some(RpcSimulateTransactionAccountsConfig {
                encoding: Some(UiAccountEncoding::Base64),
                addresses: vec![user_token_out.to_string()],
            }),
            ..Default::default()
        };

        let simulation = rpc_client
            .simulate_transaction_with_config(&transaction, config)
            .await?
            .value;

        if let Some(err) = simulation.err {
            return Err(DlmmError::SimulationFailed {
                message: format!("{err:?}"),
                logs: simulation.logs.unwrap_or_default(),
            }
            .into());
        }

        let post_account: Account = simulation
            .accounts
            .and_then(|accounts| accounts.into_iter().next().flatten())
            .and_then(|account| account.decode::<Account>())
            .ok_or(DlmmError::MissingSimulatedAccount)?;
        let post_balance = token_account_amount(&post_account.data)?;

        let out_amount = post_balance.saturating_sub(pre_balance);
        debug!(
            "Simulated swap of {in_amount}: out {out_amount}, units {:?}",
            simulation.units_consumed
        );

        Ok(SwapQuote {
            consumed_in_amount: in_amount,
            out_amount,
            min_out_amount: get_min_out_amount(out_amount, slippage_bps),
            bin_arrays_pubkey: bin_arrays.to_vec(),
        })
    }

    /// 构建交换指令
    /// Swap `in_amount` of `in_token` for at least `min_out_amount` of `out_token`
    pub fn swap(
        &self,
        in_token: Pubkey,
        out_token: Pubkey,
        in_amount: u64,
        min_out_amount: u64,
        user: Pubkey,
        bin_arrays_pubkey: &[Pubkey],
    ) -> Result<Vec<Instruction>> {
        let (token_in, token_out) = if in_token == self.token_x.public_key
            && out_token == self.token_y.public_key
        {
            (self.token_x, self.token_y)
        } else if in_token == self.token_y.public_key && out_token == self.token_x.public_key {
            (self.token_y, self.token_x)
        } else {
            bail!("tokens {in_token} -> {out_token} do not belong to pool {}", self.pubkey);
        };

        let (event_authority, _bump) = derive_event_authority_pda();

        let main_accounts = accounts::Swap {
            lb_pair: self.pubkey,
            bin_array_bitmap_extension: self.bin_array_bitmap_extension,
            reserve_x: self.lb_pair.reserve_x,
            reserve_y: self.lb_pair.reserve_y,
            user_token_in: self.user_token_account(user, &token_in),
            user_token_out: self.user_token_account(user, &token_out),
            token_x_mint: self.token_x.public_key,
            token_y_mint: self.token_y.public_key,
            oracle: self.lb_pair.oracle,
            host_fee_in: None,
            user,
            token_x_program: self.token_x.program,
            token_y_program: self.token_y.program,
            event_authority,
        };

        let remaining_accounts = bin_arrays_pubkey
            .iter()
            .map(|key| AccountMeta::new(*key, false))
            .collect::<Vec<_>>();

        let swap_ix = build_instruction(
            &main_accounts,
            &args::Swap {
                amount_in: in_amount,
                min_amount_out: min_out_amount,
            },
            remaining_accounts,
        )?;

        Ok(vec![self.create_user_token_account_ix(user, &token_out), swap_ix])
    }
}
