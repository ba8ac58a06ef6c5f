//! MIFARE DESFire EV2 secure messaging
//!
//! This crate implements the EV2 secure channel of DESFire cards: the
//! `AuthenticateEV2First`/`AuthenticateEV2NonFirst` mutual authentication,
//! CMAC-based session key derivation and the per-command authenticated
//! encryption applied to file and transaction operations.
//!
//! ```no_run
//! use desfire_ev2::{DesfireSecureChannel, DesfireEv2, Key};
//! # fn example<T: desfire_ev2::CardTransport>(transport: T) -> desfire_ev2::Result<()> {
//! let key = Key::<DesfireEv2>::default();
//! let mut channel = DesfireSecureChannel::new(transport);
//! channel.authenticate_ev2_first(0, &key)?;
//! let uid = channel.get_card_uid()?;
//! println!("card UID: {uid}");
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

mod commands;
pub mod constants;
mod crypto;
mod error;
mod secure_channel;
mod session;
mod types;
mod util;

pub use crypto::DesfireEv2;
pub use error::{Error, Result};
pub use secure_channel::DesfireSecureChannel;
pub use session::{AuthKind, Keys, Session};
pub use types::{CardUid, CommunicationMode, FileSettings, TransactionMac};

// Re-export the cipher key type so callers do not need the crate directly
pub use cipher::Key;

// Re-export the transport layer
pub use desfire_apdu::{CardTransport, Error as ApduError, StatusWord};
