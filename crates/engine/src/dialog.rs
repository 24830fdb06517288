//! Referral dialog – open/close actions and the state they drive.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReferralDialogAction {
    #[serde(rename = "DIALOG_REFERRAL_OPEN")]
    Open,
    #[serde(rename = "DIALOG_REFERRAL_CLOSE")]
    Close,
}

pub fn open() -> ReferralDialogAction {
    ReferralDialogAction::Open
}

pub fn close() -> ReferralDialogAction {
    ReferralDialogAction::Close
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReferralDialogState {
    pub open: bool,
}

impl ReferralDialogState {
    pub fn reduce(self, action: ReferralDialogAction) -> Self {
        match action {
            ReferralDialogAction::Open => Self { open: true },
            ReferralDialogAction::Close => Self { open: false },
        }
    }
}
