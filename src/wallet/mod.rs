//! Wallet Provider Layer
//!
//! Every Lightning operation is delegated to an external, pre-authorized
//! wallet provider. This module defines the provider interface, the `Wallet`
//! facade that detects provider presence at call time, operator input
//! validation, and the LNbits adapter.

pub mod lnbits;
pub mod provider;
pub mod validate;

pub use lnbits::LnbitsProvider;
pub use provider::{Invoice, InvoiceRequest, NodeInfo, PaymentReceipt, Wallet, WalletProvider};
