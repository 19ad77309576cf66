use std::fmt::Write;

use crate::*;

const SEPARATOR_WIDTH: usize = 50;

/// 格式化仓位列表，标注每个仓位相对活跃bin的状态
/// Render the position listing with each position's range status.
pub fn format_positions(active_bin_id: i32, positions: &[LbPosition]) -> String {
    if positions.is_empty() {
        return "No active positions found.\n".to_string();
    }

    let separator = "-".repeat(SEPARATOR_WIDTH);
    let mut out = String::new();

    // 写入 String 不会失败
    let _ = writeln!(out, "\nActive Positions:");
    let _ = writeln!(out, "{separator}");
    let _ = writeln!(out, "Current Active Bin ID: {active_bin_id}");
    let _ = writeln!(out, "{separator}");

    for (i, position) in positions.iter().enumerate() {
        let PositionData {
            lower_bin_id,
            upper_bin_id,
            total_x_amount,
            total_y_amount,
            ref position_bin_data,
            ..
        } = position.position_data;
        let status = RangeStatus::of(lower_bin_id, upper_bin_id, active_bin_id);

        let _ = writeln!(out, "Position {}:", i + 1);
        let _ = writeln!(out, "Public Key: {}", position.public_key);
        let _ = writeln!(out, "Total X Amount: {total_x_amount}");
        let _ = writeln!(out, "Total Y Amount: {total_y_amount}");
        let _ = writeln!(out, "Number of Bins: {}", position_bin_data.len());
        let _ = writeln!(out, "Lower Bin: {lower_bin_id}");
        let _ = writeln!(out, "Upper Bin: {upper_bin_id}");
        let _ = writeln!(out, "Status: {}", status.label());

        match status {
            RangeStatus::InRange => {}
            RangeStatus::Below { distance } => {
                let _ = writeln!(out, "Position is {distance} bins below current range");
            }
            RangeStatus::Above { distance } => {
                let _ = writeln!(out, "Position is {distance} bins above current range");
            }
        }
        let _ = writeln!(out, "{separator}");
    }

    out
}

/// 显示用户在该池中的所有仓位
pub async fn execute_display_positions<C: Deref<Target = impl Signer> + Clone>(
    pool: &mut DlmmPool<C>,
) -> Result<()> {
    pool.refetch_states().await?;

    let user = pool.program().payer();
    let UserPositions {
        active_bin,
        user_positions,
    } = pool.get_positions_by_user_and_lb_pair(user).await?;

    print!("{}", format_positions(active_bin.bin_id, &user_positions));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lb_position(lower_bin_id: i32, upper_bin_id: i32) -> LbPosition {
        LbPosition {
            public_key: Pubkey::new_unique(),
            position_data: PositionData {
                lower_bin_id,
                upper_bin_id,
                total_x_amount: 0,
                total_y_amount: 100_000_000,
                fee_owner: Pubkey::default(),
                position_bin_data: (lower_bin_id..=upper_bin_id)
                    .map(|bin_id| PositionBinData {
                        bin_id,
                        position_liquidity: 0,
                        position_x_amount: 0,
                        position_y_amount: 0,
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn empty_listing() {
        assert_eq!(format_positions(10, &[]), "No active positions found.\n");
    }

    #[test]
    fn in_range_position() {
        let position = lb_position(5, 15);
        let out = format_positions(10, std::slice::from_ref(&position));
        let separator = "-".repeat(50);
        let expected = format!(
            "\nActive Positions:\n{separator}\nCurrent Active Bin ID: 10\n{separator}\n\
             Position 1:\nPublic Key: {}\nTotal X Amount: 0\nTotal Y Amount: 100000000\n\
             Number of Bins: 11\nLower Bin: 5\nUpper Bin: 15\nStatus: ✅ IN RANGE\n{separator}\n",
            position.public_key
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn out_of_range_positions_report_distance() {
        let positions = [lb_position(20, 30), lb_position(-10, 0)];
        let out = format_positions(12, &positions);
        assert!(out.contains("Position 1:"));
        assert!(out.contains("Position 2:"));
        assert!(out.contains("Position is 8 bins below current range"));
        assert!(out.contains("Position is 12 bins above current range"));
        assert_eq!(out.matches("❌ OUT OF RANGE").count(), 2);
        assert!(!out.contains("✅"));
    }
}
