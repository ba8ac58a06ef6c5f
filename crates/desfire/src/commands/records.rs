//! ReadRecords and WriteRecord on linear and cyclic record files

use bytes::{Bytes, BytesMut};

use super::{SecureCommand, data::file_range_header};
use crate::constants::ins;

/// ReadRecords in full communication mode
#[derive(Debug, Clone)]
pub(crate) struct ReadRecordsCommand {
    file_no: u8,
    record_no: u32,
    record_count: u32,
}

impl ReadRecordsCommand {
    pub(crate) const fn new(file_no: u8, record_no: u32, record_count: u32) -> Self {
        Self {
            file_no,
            record_no,
            record_count,
        }
    }
}

impl SecureCommand for ReadRecordsCommand {
    const INS: u8 = ins::READ_RECORDS;
    const RESPONSE_ENCRYPTED: bool = true;
    const RESPONSE_MAC_OVER_PAYLOAD: bool = true;

    fn header(&self) -> Bytes {
        file_range_header(self.file_no, self.record_no, self.record_count)
    }
}

/// WriteRecord in full communication mode
#[derive(Debug, Clone)]
pub(crate) struct WriteRecordCommand {
    file_no: u8,
    offset: u32,
    data: Bytes,
}

impl WriteRecordCommand {
    pub(crate) const fn new(file_no: u8, offset: u32, data: Bytes) -> Self {
        Self {
            file_no,
            offset,
            data,
        }
    }
}

impl SecureCommand for WriteRecordCommand {
    const INS: u8 = ins::WRITE_RECORD;

    fn header(&self) -> Bytes {
        file_range_header(self.file_no, self.offset, self.data.len() as u32)
    }

    fn plaintext(&self) -> Option<BytesMut> {
        Some(BytesMut::from(self.data.as_ref()))
    }
}
