use anchor_client::solana_client::client_error::{ClientError as RpcClientError, ClientErrorKind};
use anchor_client::solana_client::rpc_request::{RpcError, RpcResponseErrorData};
use thiserror::Error;

/// 钱包密钥加载错误
/// Errors raised while loading the user's signing key
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("PRIVATE_KEY is not set and wallet file {path} could not be read: {reason}")]
    Missing { path: String, reason: String },
    #[error("private key is not a list of byte values: {0}")]
    NotByteList(#[from] serde_json::Error),
    #[error("private key must hold 64 bytes, got {0}")]
    InvalidLength(usize),
    #[error("private key bytes do not form a valid keypair: {0}")]
    InvalidKeypair(String),
}

/// DLMM 账户读取与交易构建错误
/// Errors raised while reading DLMM state or assembling transactions
#[derive(Debug, Error)]
pub enum DlmmError {
    #[error("{account} account data is {actual} bytes, expected at least {expected}")]
    AccountTooShort {
        account: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("account is not a {0} account")]
    InvalidDiscriminator(&'static str),
    #[error("unknown token program flag {0}")]
    UnknownTokenProgramFlag(u8),
    #[error("bin {bin_id} is outside bin array {index}")]
    BinOutOfArray { bin_id: i32, index: i64 },
    #[error("bin {bin_id} is outside position range {lower_bin_id}..={upper_bin_id}")]
    BinOutOfPosition {
        bin_id: i32,
        lower_bin_id: i32,
        upper_bin_id: i32,
    },
    #[error("position width {0} must be between 1 and 70 bins")]
    InvalidPositionWidth(i32),
    #[error("no initialized bin array found for swap from active bin {active_id}")]
    NoBinArrayForSwap { active_id: i32 },
    #[error("transaction simulation failed: {message}")]
    SimulationFailed { message: String, logs: Vec<String> },
    #[error("simulation did not return the output token account")]
    MissingSimulatedAccount,
    #[error("math overflow")]
    MathOverflow,
}

fn preflight_logs(err: &RpcClientError) -> Option<Vec<String>> {
    match err.kind() {
        ClientErrorKind::RpcError(RpcError::RpcResponseError {
            data: RpcResponseErrorData::SendTransactionPreflightFailure(result),
            ..
        }) => result.logs.clone(),
        _ => None,
    }
}

/// 从错误链中提取交易日志：预检失败日志或模拟日志
/// Program logs carried anywhere in the error chain: preflight failure logs from the RPC
/// client (directly or wrapped by the anchor client) or swap simulation logs.
pub fn failure_logs(err: &anyhow::Error) -> Option<Vec<String>> {
    err.chain().find_map(|cause| {
        if let Some(DlmmError::SimulationFailed { logs, .. }) = cause.downcast_ref::<DlmmError>() {
            return Some(logs.clone());
        }
        if let Some(rpc_err) = cause.downcast_ref::<RpcClientError>() {
            return preflight_logs(rpc_err);
        }
        cause
            .downcast_ref::<Box<RpcClientError>>()
            .and_then(|rpc_err| preflight_logs(rpc_err))
    })
}

/// 面向控制台的错误描述：有日志时输出日志，否则输出错误链
pub fn describe_failure(err: &anyhow::Error) -> String {
    match failure_logs(err) {
        Some(logs) => format!("{logs:?}"),
        None => format!("{err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn simulation_logs_are_found_through_context() {
        let err = Err::<(), _>(DlmmError::SimulationFailed {
            message: "InstructionError(1, Custom(6003))".to_string(),
            logs: vec!["Program log: ExceededAmountSlippageTolerance".to_string()],
        })
        .context("quote swap")
        .unwrap_err();

        assert_eq!(
            failure_logs(&err).unwrap(),
            vec!["Program log: ExceededAmountSlippageTolerance".to_string()]
        );
        assert_eq!(
            describe_failure(&err),
            r#"["Program log: ExceededAmountSlippageTolerance"]"#
        );
    }

    #[test]
    fn errors_without_logs_print_the_chain() {
        let err = Err::<(), _>(DlmmError::NoBinArrayForSwap { active_id: 12 })
            .context("swap")
            .unwrap_err();
        assert!(failure_logs(&err).is_none());
        assert_eq!(
            describe_failure(&err),
            "swap: no initialized bin array found for swap from active bin 12"
        );
    }

    #[test]
    fn rpc_errors_without_preflight_data_have_no_logs() {
        let err = anyhow::Error::from(RpcClientError::from(ClientErrorKind::Custom(
            "connection refused".to_string(),
        )));
        assert!(failure_logs(&err).is_none());
    }
}
