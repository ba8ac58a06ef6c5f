//! Typed commands executed through the secure channel
//!
//! Each command describes its instruction code, its plain command header
//! and (for write-style operations) the plaintext the channel must pad and
//! encrypt. How the card secures the matching response is declared through
//! the two associated flags, so the channel can run one codec for all of
//! them.

use bytes::{Bytes, BytesMut};

mod data;
mod records;
mod transaction;
mod uid;

pub(crate) use data::{ReadDataCommand, WriteDataCommand};
pub(crate) use records::{ReadRecordsCommand, WriteRecordCommand};
pub(crate) use transaction::{
    CommitTransactionCommand, CreateTransactionMacFileCommand, DeleteTransactionMacFileCommand,
};
pub(crate) use uid::GetCardUidCommand;

/// A command sent in full (encrypted + MACed) communication mode
pub(crate) trait SecureCommand {
    /// Native instruction code
    const INS: u8;

    /// Whether the response body is enciphered
    const RESPONSE_ENCRYPTED: bool = false;

    /// Whether the response MAC covers the response body (as received,
    /// before any decryption) or only the status, counter and TI
    const RESPONSE_MAC_OVER_PAYLOAD: bool = false;

    /// Command header, transmitted in the clear
    fn header(&self) -> Bytes;

    /// Plaintext to pad and encrypt after the header, if any
    fn plaintext(&self) -> Option<BytesMut> {
        None
    }
}
