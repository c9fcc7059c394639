//! Ledger settings

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Only accept signed QR payloads (`<code>.<signature>`).
    /// When false, bare codes are accepted too; a signature that is present
    /// is still verified.
    /// Default: true
    #[serde(default = "default_require_signed_qr")]
    pub require_signed_qr: bool,
}

fn default_require_signed_qr() -> bool {
    true
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            require_signed_qr: default_require_signed_qr(),
        }
    }
}
