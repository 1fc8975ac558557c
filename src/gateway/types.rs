//! Gateway value types.

use std::fmt;

use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionReceipt;

/// Wei per 0.001 native token.
const WEI_PER_MILLI: u64 = 1_000_000_000_000_000;

/// Native token balance.
///
/// Displays with exactly three decimals, rounding half up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    wei: U256,
}

impl Balance {
    pub fn from_wei(wei: U256) -> Self {
        Self { wei }
    }

    pub fn wei(&self) -> U256 {
        self.wei
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = U256::from(WEI_PER_MILLI);
        let milli = self.wei.saturating_add(unit / U256::from(2u64)) / unit;
        let whole = milli / U256::from(1000u64);
        let frac = u64::try_from(milli % U256::from(1000u64)).unwrap_or_default();
        write!(f, "{}.{:03}", whole, frac)
    }
}

/// Address and balance of the primary account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub address: Address,
    pub balance: Balance,
}

/// Outcome of a receipt lookup.
#[derive(Debug, Clone)]
pub enum TransactionStatus {
    /// Not yet mined.
    Pending,
    Mined(Box<TransactionReceipt>),
}

impl TransactionStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether execution succeeded; `None` while pending.
    pub fn succeeded(&self) -> Option<bool> {
        match self {
            Self::Pending => None,
            Self::Mined(receipt) => Some(receipt.status()),
        }
    }

    pub fn block_number(&self) -> Option<u64> {
        match self {
            Self::Pending => None,
            Self::Mined(receipt) => receipt.block_number,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Mined(receipt) => {
                let outcome = if receipt.status() { "success" } else { "reverted" };
                match receipt.block_number {
                    Some(block) => write!(f, "mined in block {} ({})", block, outcome),
                    None => write!(f, "mined ({})", outcome),
                }
            }
        }
    }
}
