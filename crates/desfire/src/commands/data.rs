//! ReadData and WriteData on standard and backup data files

use bytes::{BufMut, Bytes, BytesMut};

use super::SecureCommand;
use crate::constants::ins;
use crate::util;

/// ReadData in full communication mode
#[derive(Debug, Clone)]
pub(crate) struct ReadDataCommand {
    file_no: u8,
    offset: u32,
    length: u32,
}

impl ReadDataCommand {
    pub(crate) const fn new(file_no: u8, offset: u32, length: u32) -> Self {
        Self {
            file_no,
            offset,
            length,
        }
    }
}

impl SecureCommand for ReadDataCommand {
    const INS: u8 = ins::READ_DATA;
    const RESPONSE_ENCRYPTED: bool = true;
    const RESPONSE_MAC_OVER_PAYLOAD: bool = true;

    fn header(&self) -> Bytes {
        file_range_header(self.file_no, self.offset, self.length)
    }
}

/// WriteData in full communication mode
#[derive(Debug, Clone)]
pub(crate) struct WriteDataCommand {
    file_no: u8,
    offset: u32,
    data: Bytes,
}

impl WriteDataCommand {
    pub(crate) const fn new(file_no: u8, offset: u32, data: Bytes) -> Self {
        Self {
            file_no,
            offset,
            data,
        }
    }
}

impl SecureCommand for WriteDataCommand {
    const INS: u8 = ins::WRITE_DATA;

    fn header(&self) -> Bytes {
        // length is the unpadded data length
        file_range_header(self.file_no, self.offset, self.data.len() as u32)
    }

    fn plaintext(&self) -> Option<BytesMut> {
        Some(BytesMut::from(self.data.as_ref()))
    }
}

/// Header shared by the data file commands: fileNo || offset || length, LSB first
pub(super) fn file_range_header(file_no: u8, offset: u32, length: u32) -> Bytes {
    let mut header = BytesMut::with_capacity(7);
    header.put_u8(file_no);
    header.put_slice(&util::u24_le(offset));
    header.put_slice(&util::u24_le(length));
    header.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_read_data_header() {
        let cmd = ReadDataCommand::new(0x00, 0, 0x30);
        assert_eq!(cmd.header().as_ref(), hex!("00000000300000"));
    }

    #[test]
    fn test_write_data_header_uses_unpadded_length() {
        let cmd = WriteDataCommand::new(0x00, 0, Bytes::from_static(&[0x22; 25]));
        assert_eq!(cmd.header().as_ref(), hex!("00000000190000"));
        assert_eq!(cmd.plaintext().unwrap().len(), 25);
    }
}
