use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WalletTransactionType {
    Earning,
    Withdrawal,
    Adjustment,
}

impl WalletTransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletTransactionType::Earning => "earning",
            WalletTransactionType::Withdrawal => "withdrawal",
            WalletTransactionType::Adjustment => "adjustment",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "earning" => Some(WalletTransactionType::Earning),
            "withdrawal" => Some(WalletTransactionType::Withdrawal),
            "adjustment" => Some(WalletTransactionType::Adjustment),
            _ => None,
        }
    }
}

impl Display for WalletTransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WalletTransactionStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl WalletTransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletTransactionStatus::Pending => "pending",
            WalletTransactionStatus::Completed => "completed",
            WalletTransactionStatus::Failed => "failed",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(WalletTransactionStatus::Pending),
            "completed" => Some(WalletTransactionStatus::Completed),
            "failed" => Some(WalletTransactionStatus::Failed),
            _ => None,
        }
    }
}

impl Display for WalletTransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
