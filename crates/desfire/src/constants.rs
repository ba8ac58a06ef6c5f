//! Constants used in DESFire EV2 secure messaging
//!
//! This module contains the command codes, status words and fixed labels
//! defined by the DESFire EV2 native protocol.

/// Command classes
pub mod cla {
    /// Native commands wrapped in ISO 7816-4 APDUs
    pub const NATIVE: u8 = 0x90;
}

/// Native instruction codes
pub mod ins {
    /// AuthenticateEV2First, starts a fresh transaction
    pub const AUTHENTICATE_EV2_FIRST: u8 = 0x71;
    /// AuthenticateEV2NonFirst, key switch within a transaction
    pub const AUTHENTICATE_EV2_NON_FIRST: u8 = 0x77;
    /// Additional frame, carries the second pass of a chained command
    pub const ADDITIONAL_FRAME: u8 = 0xAF;
    /// ReadData from a standard or backup data file
    pub const READ_DATA: u8 = 0xAD;
    /// WriteData to a standard or backup data file
    pub const WRITE_DATA: u8 = 0x8D;
    /// ReadRecords from a linear or cyclic record file
    pub const READ_RECORDS: u8 = 0xAB;
    /// WriteRecord to a linear or cyclic record file
    pub const WRITE_RECORD: u8 = 0x8B;
    /// CommitTransaction
    pub const COMMIT_TRANSACTION: u8 = 0xC7;
    /// CreateTransactionMACFile
    pub const CREATE_TRANSACTION_MAC_FILE: u8 = 0xCE;
    /// DeleteTransactionMACFile
    pub const DELETE_TRANSACTION_MAC_FILE: u8 = 0xDF;
    /// GetCardUID
    pub const GET_CARD_UID: u8 = 0x51;
    /// GetFileSettings
    pub const GET_FILE_SETTINGS: u8 = 0xF5;
}

/// Status words returned by the card
pub mod status {
    use desfire_apdu::StatusWord;

    /// SW1 for every native response
    pub const SW1_NATIVE: u8 = 0x91;
    /// Operation completed successfully
    pub const OPERATION_OK: StatusWord = StatusWord::new(0x91, 0x00);
    /// More data is expected or available
    pub const ADDITIONAL_FRAME: StatusWord = StatusWord::new(0x91, 0xAF);

    /// Card-reported error codes (SW2 under SW1 = 0x91)
    pub mod code {
        /// No changes done to backup files
        pub const NO_CHANGES: u8 = 0x0C;
        /// Insufficient NV memory to complete command
        pub const OUT_OF_EEPROM: u8 = 0x0E;
        /// Command code not supported
        pub const ILLEGAL_COMMAND: u8 = 0x1C;
        /// CRC or MAC does not match data
        pub const INTEGRITY_ERROR: u8 = 0x1E;
        /// Invalid key number specified
        pub const NO_SUCH_KEY: u8 = 0x40;
        /// Length of command string invalid
        pub const LENGTH_ERROR: u8 = 0x7E;
        /// Current configuration / status does not allow the command
        pub const PERMISSION_DENIED: u8 = 0x9D;
        /// Value of the parameter invalid
        pub const PARAMETER_ERROR: u8 = 0x9E;
        /// Requested AID not present on PICC
        pub const APPLICATION_NOT_FOUND: u8 = 0xA0;
        /// Current authentication status does not allow the command
        pub const AUTHENTICATION_ERROR: u8 = 0xAE;
        /// Attempt to read/write beyond the file's limits
        pub const BOUNDARY_ERROR: u8 = 0xBE;
        /// Previous command was not fully completed
        pub const COMMAND_ABORTED: u8 = 0xCA;
        /// Number of applications or files exceeded
        pub const COUNT_ERROR: u8 = 0xCE;
        /// File or application with same number already exists
        pub const DUPLICATE_ERROR: u8 = 0xDE;
        /// Specified file number does not exist
        pub const FILE_NOT_FOUND: u8 = 0xF0;
    }

    /// Description of a card-reported SW2 error code
    pub const fn description(sw2: u8) -> &'static str {
        match sw2 {
            0x00 => "Operation OK",
            code::NO_CHANGES => "No changes",
            code::OUT_OF_EEPROM => "Out of EEPROM",
            code::ILLEGAL_COMMAND => "Illegal command code",
            code::INTEGRITY_ERROR => "Integrity error",
            code::NO_SUCH_KEY => "No such key",
            code::LENGTH_ERROR => "Length error",
            code::PERMISSION_DENIED => "Permission denied",
            code::PARAMETER_ERROR => "Parameter error",
            code::APPLICATION_NOT_FOUND => "Application not found",
            code::AUTHENTICATION_ERROR => "Authentication error",
            0xAF => "Additional frame",
            code::BOUNDARY_ERROR => "Boundary error",
            code::COMMAND_ABORTED => "Command aborted",
            code::COUNT_ERROR => "Count error",
            code::DUPLICATE_ERROR => "Duplicate error",
            code::FILE_NOT_FOUND => "File not found",
            _ => "Unknown error code",
        }
    }
}

/// Fixed two-byte labels used in key and IV derivation
pub mod label {
    /// KDF label for the session encryption key
    pub const SESSION_ENC: [u8; 2] = [0xA5, 0x5A];
    /// KDF label for the session MAC key
    pub const SESSION_MAC: [u8; 2] = [0x5A, 0xA5];
    /// IV label for command data
    pub const IV_COMMAND: [u8; 2] = [0xA5, 0x5A];
    /// IV label for response data
    pub const IV_RESPONSE: [u8; 2] = [0x5A, 0xA5];
    /// KDF counter field (fixed to 1)
    pub const KDF_COUNTER: [u8; 2] = [0x00, 0x01];
    /// KDF output length field (fixed to 128 bits)
    pub const KDF_LENGTH: [u8; 2] = [0x00, 0x80];
}

/// File communication settings bytes
pub mod comm_mode {
    /// Plain communication
    pub const PLAIN: u8 = 0x00;
    /// Plain data, MACed
    pub const MACED: u8 = 0x01;
    /// Fully enciphered
    pub const FULL: u8 = 0x03;
}

/// Fixed bytes for transaction MAC file creation
pub mod tmac {
    /// Access rights for a transaction MAC file (Read free, no Write, R/W and Change reserved)
    pub const ACCESS_RIGHTS: [u8; 2] = [0x10, 0x1F];
    /// Key option for an AES transaction MAC key
    pub const KEY_OPTION_AES: u8 = 0x02;
}

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;
