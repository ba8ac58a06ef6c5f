//! Error types for EV2 secure messaging

use desfire_apdu::StatusWord;

use crate::constants::status::description;

/// Result type for DESFire operations
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for DESFire operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport and framing errors
    #[error(transparent)]
    Apdu(#[from] desfire_apdu::Error),

    /// A secured command was attempted without an authenticated session
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The authentication handshake failed; all session state is cleared
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(&'static str),

    /// The card rejected the command
    #[error("Card error {status}: {}", description(.status.sw2))]
    Card {
        /// Status word reported by the card
        status: StatusWord,
    },

    /// The response MAC did not verify; the response must not be trusted
    #[error("Response MAC verification failed")]
    ResponseMacMismatch,

    /// The response was well-framed but its content is not usable
    #[error("Invalid response data: {0}")]
    InvalidResponseData(&'static str),

    /// A request argument is outside what a single exchange can carry
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Ciphertext length was not a whole number of blocks
    #[error("Ciphertext is not block-aligned")]
    Unpad,
}

// UnpadError does not implement the error trait without std features the
// cipher crate never enables, so thiserror's #[from] cannot derive this.
impl From<cipher::block_padding::UnpadError> for Error {
    fn from(_: cipher::block_padding::UnpadError) -> Self {
        Self::Unpad
    }
}

impl Error {
    /// Create an error from a card-reported status word
    pub const fn card(status: StatusWord) -> Self {
        Self::Card { status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpad_error_converts() {
        let err = Error::from(cipher::block_padding::UnpadError);
        assert!(matches!(err, Error::Unpad));
    }

    #[test]
    fn test_card_error_describes_status() {
        let err = Error::card(StatusWord::new(0x91, 0x9D));
        assert_eq!(err.to_string(), "Card error 91 9D: Permission denied");
    }
}
