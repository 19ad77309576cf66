//! 交互式菜单：渲染、选项解析与分发循环
//! Interactive menu: rendering, choice parsing and the dispatch loop.

use std::io::Write;

use anyhow::Result;
use async_trait::async_trait;
use clap::ValueEnum;
use log::debug;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::describe_failure;

/// 菜单布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MenuLayout {
    /// 1-4 操作，5 退出
    Basic,
    /// 1-4 操作，5 显示仓位，6 退出
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    InitializePosition,
    AddLiquidity,
    RemoveLiquidity,
    Swap,
    DisplayPositions,
    Exit,
}

impl MenuChoice {
    pub fn title(&self) -> &'static str {
        match self {
            MenuChoice::InitializePosition => "Initialize Position",
            MenuChoice::AddLiquidity => "Add Liquidity",
            MenuChoice::RemoveLiquidity => "Remove Liquidity",
            MenuChoice::Swap => "Swap",
            MenuChoice::DisplayPositions => "Display Active Positions",
            MenuChoice::Exit => "Exit",
        }
    }

    /// 错误输出中使用的操作名
    /// Operation name printed in front of `::error:`
    pub fn error_label(&self) -> &'static str {
        match self {
            MenuChoice::InitializePosition => "createOneSidePosition",
            MenuChoice::AddLiquidity => "addLiquidityToExistingPosition",
            MenuChoice::RemoveLiquidity => "removePositionLiquidity",
            MenuChoice::Swap => "swap",
            MenuChoice::DisplayPositions => "displayPositions",
            MenuChoice::Exit => "exit",
        }
    }
}

impl MenuLayout {
    pub fn entries(&self) -> &'static [MenuChoice] {
        match self {
            MenuLayout::Basic => &[
                MenuChoice::InitializePosition,
                MenuChoice::AddLiquidity,
                MenuChoice::RemoveLiquidity,
                MenuChoice::Swap,
                MenuChoice::Exit,
            ],
            MenuLayout::Full => &[
                MenuChoice::InitializePosition,
                MenuChoice::AddLiquidity,
                MenuChoice::RemoveLiquidity,
                MenuChoice::Swap,
                MenuChoice::DisplayPositions,
                MenuChoice::Exit,
            ],
        }
    }

    pub fn render(&self) -> String {
        let mut menu = String::from("\nMenu:\n");
        for (i, choice) in self.entries().iter().enumerate() {
            menu.push_str(&format!("{}. {}\n", i + 1, choice.title()));
        }
        menu
    }

    /// 解析用户输入，输入去除首尾空白后必须与某个编号完全一致
    /// The trimmed input must be exactly one of the listed numbers
    pub fn parse_choice(&self, input: &str) -> Option<MenuChoice> {
        let input = input.trim();
        self.entries()
            .iter()
            .enumerate()
            .find(|(i, _)| (i + 1).to_string() == input)
            .map(|(_, choice)| *choice)
    }
}

/// 菜单操作
#[async_trait(?Send)]
pub trait MenuActions {
    async fn initialize_position(&mut self) -> Result<()>;
    async fn add_liquidity(&mut self) -> Result<()>;
    async fn remove_liquidity(&mut self) -> Result<()>;
    async fn swap(&mut self) -> Result<()>;
    async fn display_positions(&mut self) -> Result<()>;
}

/// 运行菜单循环，直到选择退出或输入结束
/// Run the menu until Exit is chosen or the input ends. A failing action is reported
/// and the loop goes on.
pub async fn run_menu<A, R, W>(
    actions: &mut A,
    layout: MenuLayout,
    input: R,
    output: &mut W,
) -> Result<()>
where
    A: MenuActions,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(output, "{}", layout.render())?;
        write!(output, "Enter your choice: ")?;
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            debug!("Input closed, leaving menu");
            break;
        };

        let Some(choice) = layout.parse_choice(&line) else {
            writeln!(output, "Invalid choice. Please try again.")?;
            continue;
        };

        let result = match choice {
            MenuChoice::InitializePosition => actions.initialize_position().await,
            MenuChoice::AddLiquidity => actions.add_liquidity().await,
            MenuChoice::RemoveLiquidity => actions.remove_liquidity().await,
            MenuChoice::Swap => actions.swap().await,
            MenuChoice::DisplayPositions => actions.display_positions().await,
            MenuChoice::Exit => break,
        };

        if let Err(err) = result {
            writeln!(
                output,
                "🚀 ~ {}::error: {}",
                choice.error_label(),
                describe_failure(&err)
            )?;
        }
    }

    Ok(())
}
