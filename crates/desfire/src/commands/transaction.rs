//! Transaction commands: commit and transaction MAC file management

use bytes::{BufMut, Bytes, BytesMut};
use cipher::Key;

use super::SecureCommand;
use crate::constants::{ins, tmac};
use crate::crypto::DesfireEv2;
use crate::types::CommunicationMode;

/// CommitTransaction
#[derive(Debug, Clone)]
pub(crate) struct CommitTransactionCommand {
    /// Option 0x01 asks the card to return the transaction MAC counter and value
    option: u8,
}

impl CommitTransactionCommand {
    pub(crate) const fn new(return_tmac: bool) -> Self {
        Self {
            option: if return_tmac { 0x01 } else { 0x00 },
        }
    }
}

impl SecureCommand for CommitTransactionCommand {
    const INS: u8 = ins::COMMIT_TRANSACTION;
    // TMC and TMV come back in the clear but under the response MAC
    const RESPONSE_MAC_OVER_PAYLOAD: bool = true;

    fn header(&self) -> Bytes {
        Bytes::copy_from_slice(&[self.option])
    }
}

/// CreateTransactionMACFile with an AES transaction MAC key
pub(crate) struct CreateTransactionMacFileCommand {
    file_no: u8,
    comm_mode: CommunicationMode,
    key: Key<DesfireEv2>,
    key_version: u8,
}

impl std::fmt::Debug for CreateTransactionMacFileCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateTransactionMacFileCommand")
            .field("file_no", &self.file_no)
            .field("comm_mode", &self.comm_mode)
            .field("key_version", &self.key_version)
            .finish_non_exhaustive()
    }
}

impl CreateTransactionMacFileCommand {
    pub(crate) const fn new(
        file_no: u8,
        comm_mode: CommunicationMode,
        key: Key<DesfireEv2>,
        key_version: u8,
    ) -> Self {
        Self {
            file_no,
            comm_mode,
            key,
            key_version,
        }
    }
}

impl SecureCommand for CreateTransactionMacFileCommand {
    const INS: u8 = ins::CREATE_TRANSACTION_MAC_FILE;

    fn header(&self) -> Bytes {
        let mut header = BytesMut::with_capacity(5);
        header.put_u8(self.file_no);
        header.put_u8(self.comm_mode.to_byte());
        header.put_slice(&tmac::ACCESS_RIGHTS);
        header.put_u8(tmac::KEY_OPTION_AES);
        header.freeze()
    }

    fn plaintext(&self) -> Option<BytesMut> {
        // key then its version; padding fills the second block
        let mut plaintext = BytesMut::with_capacity(17);
        plaintext.put_slice(&self.key);
        plaintext.put_u8(self.key_version);
        Some(plaintext)
    }
}

/// DeleteTransactionMACFile
#[derive(Debug, Clone)]
pub(crate) struct DeleteTransactionMacFileCommand {
    file_no: u8,
}

impl DeleteTransactionMacFileCommand {
    pub(crate) const fn new(file_no: u8) -> Self {
        Self { file_no }
    }
}

impl SecureCommand for DeleteTransactionMacFileCommand {
    const INS: u8 = ins::DELETE_TRANSACTION_MAC_FILE;

    fn header(&self) -> Bytes {
        Bytes::copy_from_slice(&[self.file_no])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_commit_header() {
        assert_eq!(CommitTransactionCommand::new(false).header().as_ref(), [0x00]);
        assert_eq!(CommitTransactionCommand::new(true).header().as_ref(), [0x01]);
    }

    #[test]
    fn test_create_tmac_file_layout() {
        let key = Key::<DesfireEv2>::from(hex!("F7D23E0C44AFADE542BFDF2DC5C6AE02"));
        let cmd =
            CreateTransactionMacFileCommand::new(0x0F, CommunicationMode::Plain, key, 0x00);

        assert_eq!(cmd.header().as_ref(), hex!("0F00101F02"));

        let plaintext = cmd.plaintext().unwrap();
        assert_eq!(plaintext.len(), 17);
        assert_eq!(&plaintext[0..16], hex!("F7D23E0C44AFADE542BFDF2DC5C6AE02"));
        assert_eq!(plaintext[16], 0x00);
    }

    #[test]
    fn test_delete_tmac_file_header() {
        assert_eq!(
            DeleteTransactionMacFileCommand::new(0x0F).header().as_ref(),
            [0x0F]
        );
    }
}
