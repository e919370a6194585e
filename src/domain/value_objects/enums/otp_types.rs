use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Which physical transition a service OTP authorizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OtpType {
    Start,
    End,
}

impl OtpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpType::Start => "start",
            OtpType::End => "end",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "start" => Some(OtpType::Start),
            "end" => Some(OtpType::End),
            _ => None,
        }
    }
}

impl Display for OtpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
