use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Assigned,
    Upcoming,
    Ongoing,
    Completed,
    UserCancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Assigned => "assigned",
            BookingStatus::Upcoming => "upcoming",
            BookingStatus::Ongoing => "ongoing",
            BookingStatus::Completed => "completed",
            BookingStatus::UserCancelled => "user_cancelled",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "assigned" => Some(BookingStatus::Assigned),
            "upcoming" => Some(BookingStatus::Upcoming),
            "ongoing" => Some(BookingStatus::Ongoing),
            "completed" => Some(BookingStatus::Completed),
            "user_cancelled" => Some(BookingStatus::UserCancelled),
            _ => None,
        }
    }

    /// Allowed-transitions table. Anything not listed here is rejected.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Assigned)
                | (Pending, Upcoming)
                | (Pending, UserCancelled)
                | (Confirmed, Assigned)
                | (Confirmed, Upcoming)
                | (Confirmed, Ongoing)
                | (Confirmed, UserCancelled)
                | (Assigned, Upcoming)
                | (Assigned, Ongoing)
                | (Assigned, UserCancelled)
                | (Upcoming, Ongoing)
                | (Upcoming, UserCancelled)
                | (Ongoing, Completed)
        )
    }

    /// Owner-initiated cancellation is only possible before the service starts.
    pub fn is_cancellable(&self) -> bool {
        self.can_transition_to(BookingStatus::UserCancelled)
    }

    pub fn is_startable(&self) -> bool {
        self.can_transition_to(BookingStatus::Ongoing)
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
