//! Session state for the EV2 secure channel
//!
//! A `Session` only ever comes out of a successful authentication and
//! carries the derived keys, the transaction identifier and the command
//! counter that orders every secured exchange.

use cipher::Key;
use zeroize::Zeroize;

use crate::crypto::DesfireEv2;

/// Derived EV2 session keys
#[derive(Debug, Clone)]
pub struct Keys {
    /// Encryption key
    enc: Key<DesfireEv2>,
    /// MAC key
    mac: Key<DesfireEv2>,
}

impl Zeroize for Keys {
    fn zeroize(&mut self) {
        self.enc.as_mut_slice().zeroize();
        self.mac.as_mut_slice().zeroize();
    }
}

impl Drop for Keys {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl Keys {
    /// Create a new key set with the specified encryption and MAC keys.
    pub(crate) const fn new(enc: Key<DesfireEv2>, mac: Key<DesfireEv2>) -> Self {
        Self { enc, mac }
    }

    /// Get the encryption key
    pub(crate) const fn enc(&self) -> &Key<DesfireEv2> {
        &self.enc
    }

    /// Get the MAC key
    pub(crate) const fn mac(&self) -> &Key<DesfireEv2> {
        &self.mac
    }
}

/// Which authentication variant established the current session keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    /// AuthenticateEV2First, which opened the transaction
    First,
    /// AuthenticateEV2NonFirst, a key switch within the transaction
    NonFirst,
}

/// State of an authenticated EV2 session
#[derive(Debug, Clone)]
pub struct Session {
    /// Session keys derived during authentication
    keys: Keys,
    /// Which authentication variant produced the keys
    auth_kind: AuthKind,
    /// Key number the session was authenticated with
    key_no: u8,
    /// Transaction identifier assigned by the card
    transaction_id: [u8; 4],
    /// Command counter, incremented after every successful exchange
    cmd_counter: u16,
    /// Card capabilities returned by AuthenticateEV2First
    pd_cap2: [u8; 6],
    /// Reader capabilities echoed by AuthenticateEV2First
    pcd_cap2: [u8; 6],
}

impl Session {
    /// Build the state of a freshly authenticated transaction (counter at zero)
    pub(crate) const fn new(
        keys: Keys,
        key_no: u8,
        transaction_id: [u8; 4],
        pd_cap2: [u8; 6],
        pcd_cap2: [u8; 6],
    ) -> Self {
        Self {
            keys,
            auth_kind: AuthKind::First,
            key_no,
            transaction_id,
            cmd_counter: 0,
            pd_cap2,
            pcd_cap2,
        }
    }

    /// Continue a transaction under new keys, keeping its identifier and counter
    pub(crate) fn resumed(self, keys: Keys, key_no: u8) -> Self {
        Self {
            keys,
            auth_kind: AuthKind::NonFirst,
            key_no,
            ..self
        }
    }

    /// Construct a session from raw key material, for replaying recorded exchanges
    pub fn from_raw(
        enc: &Key<DesfireEv2>,
        mac: &Key<DesfireEv2>,
        transaction_id: [u8; 4],
        cmd_counter: u16,
    ) -> Self {
        Self {
            keys: Keys::new(*enc, *mac),
            auth_kind: AuthKind::First,
            key_no: 0,
            transaction_id,
            cmd_counter,
            pd_cap2: [0; 6],
            pcd_cap2: [0; 6],
        }
    }

    /// The session keys
    pub(crate) const fn keys(&self) -> &Keys {
        &self.keys
    }

    /// Which authentication variant produced the current keys
    pub const fn auth_kind(&self) -> AuthKind {
        self.auth_kind
    }

    /// Key number used for authentication
    pub const fn key_no(&self) -> u8 {
        self.key_no
    }

    /// Transaction identifier assigned by the card
    pub const fn transaction_id(&self) -> &[u8; 4] {
        &self.transaction_id
    }

    /// Current command counter
    pub const fn cmd_counter(&self) -> u16 {
        self.cmd_counter
    }

    /// Card capabilities (PDcap2) from the first authentication
    pub const fn pd_cap2(&self) -> &[u8; 6] {
        &self.pd_cap2
    }

    /// Reader capabilities (PCDcap2) from the first authentication
    pub const fn pcd_cap2(&self) -> &[u8; 6] {
        &self.pcd_cap2
    }

    /// Advance the command counter after a successful exchange
    pub(crate) const fn advance_counter(&mut self) {
        self.cmd_counter = self.cmd_counter.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_counter_advances() {
        let key = Key::<DesfireEv2>::default();
        let mut session = Session::from_raw(&key, &key, hex!("CD73D8E5"), 0);
        assert_eq!(session.cmd_counter(), 0);
        session.advance_counter();
        session.advance_counter();
        assert_eq!(session.cmd_counter(), 2);
    }

    #[test]
    fn test_resume_keeps_transaction() {
        let key = Key::<DesfireEv2>::default();
        let mut session = Session::from_raw(&key, &key, hex!("569D4B24"), 0);
        session.advance_counter();

        let new_keys = Keys::new(key, key);
        let session = session.resumed(new_keys, 3);
        assert_eq!(session.cmd_counter(), 1);
        assert_eq!(session.transaction_id(), &hex!("569D4B24"));
        assert_eq!(session.key_no(), 3);
        assert_eq!(session.auth_kind(), AuthKind::NonFirst);
    }
}
