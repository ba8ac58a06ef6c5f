//! GetCardUID, returning the real UID under full protection

use bytes::Bytes;

use super::SecureCommand;
use crate::constants::ins;

/// GetCardUID; no header, the UID comes back enciphered
#[derive(Debug, Clone)]
pub(crate) struct GetCardUidCommand;

impl SecureCommand for GetCardUidCommand {
    const INS: u8 = ins::GET_CARD_UID;
    const RESPONSE_ENCRYPTED: bool = true;
    const RESPONSE_MAC_OVER_PAYLOAD: bool = true;

    fn header(&self) -> Bytes {
        Bytes::new()
    }
}
