//! Parsed response types

use std::fmt;

use bytes::Bytes;

use crate::Error;
use crate::constants::comm_mode;

/// Communication mode of a file, from its settings byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommunicationMode {
    /// Plain communication
    Plain,
    /// Plain data with a command/response MAC
    Maced,
    /// Fully enciphered communication
    Full,
}

impl CommunicationMode {
    /// The communication settings byte for this mode
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Plain => comm_mode::PLAIN,
            Self::Maced => comm_mode::MACED,
            Self::Full => comm_mode::FULL,
        }
    }
}

impl TryFrom<u8> for CommunicationMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        // bit 1 of the settings byte selects MAC, bits 0-1 set select full
        match value & 0x03 {
            comm_mode::PLAIN | 0x02 => Ok(Self::Plain),
            comm_mode::MACED => Ok(Self::Maced),
            comm_mode::FULL => Ok(Self::Full),
            _ => Err(Error::InvalidResponseData("unknown communication mode")),
        }
    }
}

/// Transaction MAC counter and value returned by CommitTransaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionMac {
    /// Transaction MAC counter (TMC)
    pub counter: u32,
    /// Transaction MAC value (TMV)
    pub value: [u8; 8],
}

impl TryFrom<&[u8]> for TransactionMac {
    type Error = Error;

    /// Parse TMC (4 bytes LSB first) followed by TMV (8 bytes)
    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        if data.len() != 12 {
            return Err(Error::InvalidResponseData(
                "transaction MAC data must be 12 bytes",
            ));
        }

        let mut counter = [0u8; 4];
        counter.copy_from_slice(&data[0..4]);
        let mut value = [0u8; 8];
        value.copy_from_slice(&data[4..12]);

        Ok(Self {
            counter: u32::from_le_bytes(counter),
            value,
        })
    }
}

/// The 7-byte unique identifier of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardUid([u8; 7]);

impl CardUid {
    /// Create from the raw 7 bytes
    pub const fn new(uid: [u8; 7]) -> Self {
        Self(uid)
    }

    /// The raw UID bytes
    pub const fn as_bytes(&self) -> &[u8; 7] {
        &self.0
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

/// File settings as returned by GetFileSettings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSettings {
    raw: Bytes,
}

impl FileSettings {
    /// The file type byte
    pub fn file_type(&self) -> u8 {
        self.raw[0]
    }

    /// The communication mode the file requires
    pub fn communication_mode(&self) -> Result<CommunicationMode, Error> {
        CommunicationMode::try_from(self.raw[1])
    }

    /// Access rights, two bytes as sent by the card
    pub fn access_rights(&self) -> [u8; 2] {
        [self.raw[2], self.raw[3]]
    }

    /// The raw settings bytes
    pub const fn raw(&self) -> &Bytes {
        &self.raw
    }
}

impl TryFrom<Bytes> for FileSettings {
    type Error = Error;

    fn try_from(raw: Bytes) -> Result<Self, Self::Error> {
        // file type, communication settings and access rights at minimum
        if raw.len() < 4 {
            return Err(Error::InvalidResponseData("file settings too short"));
        }
        Ok(Self { raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_transaction_mac_parse() {
        let data = hex!("040000004B5E4B1121E53E7F");
        let tmac = TransactionMac::try_from(&data[..]).unwrap();
        assert_eq!(tmac.counter, 4);
        assert_eq!(tmac.value, hex!("4B5E4B1121E53E7F"));

        assert!(TransactionMac::try_from(&data[..8]).is_err());
    }

    #[test]
    fn test_file_settings_parse() {
        // standard data file, full communication, free R/W access, 32 byte size
        let settings = FileSettings::try_from(Bytes::from_static(&hex!("0003EEEE200000"))).unwrap();
        assert_eq!(settings.file_type(), 0x00);
        assert_eq!(
            settings.communication_mode().unwrap(),
            CommunicationMode::Full
        );
        assert_eq!(settings.access_rights(), [0xEE, 0xEE]);

        assert!(FileSettings::try_from(Bytes::from_static(&[0x00])).is_err());
    }

    #[test]
    fn test_card_uid_display() {
        let uid = CardUid::new(hex!("04DE5F1EACC040"));
        assert_eq!(uid.to_string(), "04DE5F1EACC040");
    }

    #[test]
    fn test_communication_mode_round_trip() {
        assert_eq!(CommunicationMode::try_from(0x00).unwrap(), CommunicationMode::Plain);
        assert_eq!(CommunicationMode::try_from(0x01).unwrap(), CommunicationMode::Maced);
        assert_eq!(CommunicationMode::try_from(0x03).unwrap(), CommunicationMode::Full);
        assert_eq!(CommunicationMode::Full.to_byte(), 0x03);
    }
}
