//! Error taxonomy shared between the clients and the command entry point.
//!
//! Most code propagates [anyhow::Error] with context attached. The variants here are the ones
//! [crate::cli::exit_code] needs to tell apart, so they are created as [WakalogError] and later
//! recovered with `downcast_ref`.

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    WakaTime,
    GoogleSheets,
}

impl Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Vendor::WakaTime => write!(f, "WakaTime"),
            Vendor::GoogleSheets => write!(f, "Google Sheets"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WakalogError {
    /// Missing or rejected credentials for one of the services.
    #[error("{0}")]
    Auth(String),

    /// Malformed command line. Holds the usage string so it can be printed after the message.
    #[error("{message}")]
    Flag { message: String, usage: String },

    /// Non-2xx response from a vendor API.
    #[error("{message}")]
    VendorApi {
        vendor: Vendor,
        status: u16,
        message: String,
    },

    /// The user interrupted the run, either from a prompt or with Ctrl-C.
    #[error("operation cancelled")]
    Cancelled,
}

impl WakalogError {
    pub fn auth(error: impl Display) -> Self {
        Self::Auth(error.to_string())
    }

    pub fn is_cancellation(error: &anyhow::Error) -> bool {
        matches!(error.downcast_ref::<Self>(), Some(Self::Cancelled))
    }
}
