//! APDU response parsing and status word definitions

use std::fmt;

use bytes::Bytes;

use crate::Error;

/// Status Word (SW1-SW2) from an APDU response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord {
    /// First status byte (SW1)
    pub sw1: u8,
    /// Second status byte (SW2)
    pub sw2: u8,
}

impl StatusWord {
    /// Create a new status word
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    /// Create from a u16 value (SW1 | SW2)
    pub const fn from_u16(status: u16) -> Self {
        Self {
            sw1: (status >> 8) as u8,
            sw2: status as u8,
        }
    }

    /// Convert to a u16 value (SW1 | SW2)
    pub const fn to_u16(&self) -> u16 {
        ((self.sw1 as u16) << 8) | (self.sw2 as u16)
    }

    /// Check if this status word indicates ISO success (90 00)
    pub const fn is_success(&self) -> bool {
        self.sw1 == 0x90 && self.sw2 == 0x00
    }
}

impl From<(u8, u8)> for StatusWord {
    fn from(tuple: (u8, u8)) -> Self {
        Self::new(tuple.0, tuple.1)
    }
}

impl From<u16> for StatusWord {
    fn from(status: u16) -> Self {
        Self::from_u16(status)
    }
}

impl From<StatusWord> for u16 {
    fn from(status: StatusWord) -> Self {
        status.to_u16()
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X} {:02X}", self.sw1, self.sw2)
    }
}

/// An APDU response: optional payload followed by the status word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    payload: Option<Bytes>,
    status: StatusWord,
}

impl Response {
    /// Parse a response from raw bytes; the trailing two bytes are the status word
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < 2 {
            return Err(Error::ResponseTooShort(bytes.len()));
        }

        let (payload, status) = bytes.split_at(bytes.len() - 2);
        Ok(Self {
            payload: (!payload.is_empty()).then(|| Bytes::copy_from_slice(payload)),
            status: StatusWord::new(status[0], status[1]),
        })
    }

    /// The response payload, if any
    pub const fn payload(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }

    /// The status word
    pub const fn status(&self) -> StatusWord {
        self.status
    }

    /// Consume the response, returning the payload and status word
    pub fn into_parts(self) -> (Option<Bytes>, StatusWord) {
        (self.payload, self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_word_from_to_u16() {
        let sw = StatusWord::from_u16(0x9100);
        assert_eq!(sw.sw1, 0x91);
        assert_eq!(sw.sw2, 0x00);
        assert_eq!(sw.to_u16(), 0x9100);
    }

    #[test]
    fn test_response_from_bytes() {
        let resp = Response::from_bytes(&[0x91, 0x00]).unwrap();
        assert!(resp.payload().is_none());
        assert_eq!(resp.status(), StatusWord::new(0x91, 0x00));

        let resp = Response::from_bytes(&[0xDE, 0xAD, 0x91, 0xAF]).unwrap();
        assert_eq!(resp.payload().unwrap().as_ref(), &[0xDE, 0xAD]);
        assert_eq!(resp.status(), StatusWord::new(0x91, 0xAF));
    }

    #[test]
    fn test_response_too_short() {
        assert!(matches!(
            Response::from_bytes(&[0x91]),
            Err(Error::ResponseTooShort(1))
        ));
    }
}
