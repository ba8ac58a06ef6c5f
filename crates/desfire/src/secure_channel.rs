//! EV2 secure channel: authentication and the secured command codec
//!
//! `DesfireSecureChannel` wraps a [`CardTransport`] and drives the DESFire
//! native protocol in AES secure messaging. `AuthenticateEV2First` opens a
//! transaction and derives the session keys; every secured operation is
//! then encrypted and MACed against the session's transaction identifier
//! and command counter.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use cipher::{Iv, Key};
use desfire_apdu::{ApduCommand, CardTransport, Command, Response, StatusWord};
use rand::RngCore;
use tracing::{debug, warn};

use crate::commands::{
    CommitTransactionCommand, CreateTransactionMacFileCommand, DeleteTransactionMacFileCommand,
    GetCardUidCommand, ReadDataCommand, ReadRecordsCommand, SecureCommand, WriteDataCommand,
    WriteRecordCommand,
};
use crate::constants::{cla, ins, status};
use crate::crypto::{self, DesfireEv2};
use crate::error::{Error, Result};
use crate::session::{Keys, Session};
use crate::types::{CardUid, CommunicationMode, FileSettings, TransactionMac};
use crate::util;

/// Most data bytes a single secured write frame can carry:
/// 7 header bytes, the padded ciphertext and the 8-byte MAC must fit in Lc.
const MAX_FRAME_DATA: usize = 239;

/// Secure channel to a DESFire card in EV2 AES secure messaging
pub struct DesfireSecureChannel<T: CardTransport> {
    /// The underlying transport
    transport: T,
    /// Session state; present only while authenticated
    session: Option<Session>,
    /// Status word of the most recent exchange
    last_status: Option<StatusWord>,
}

impl<T: CardTransport> fmt::Debug for DesfireSecureChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesfireSecureChannel")
            .field("authenticated", &self.session.is_some())
            .field("last_status", &self.last_status)
            .finish()
    }
}

impl<T: CardTransport> DesfireSecureChannel<T> {
    /// Create a new channel over the given transport
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            session: None,
            last_status: None,
        }
    }

    /// Get a reference to the session, if authenticated
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Whether an authenticated session is active
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Status word of the most recent exchange with the card
    pub const fn last_status(&self) -> Option<StatusWord> {
        self.last_status
    }

    /// Get a reference to the underlying transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the underlying transport
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Drop the session state; subsequent secured commands fail until a
    /// fresh authentication
    pub fn close(&mut self) {
        debug!("closing EV2 secure channel");
        self.session = None;
    }

    /// Reset the transport, dropping any session state
    pub fn reset(&mut self) -> Result<()> {
        self.close();
        self.transport.reset().map_err(Error::Apdu)
    }

    /// Restore a previously established session, e.g. one recorded before
    /// the host process restarted
    pub fn restore_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    /// Run `AuthenticateEV2First` with the given application key.
    ///
    /// On success a fresh transaction is open: new session keys, a new
    /// transaction identifier and the command counter at zero. On any
    /// failure all session state is cleared.
    pub fn authenticate_ev2_first(&mut self, key_no: u8, key: &Key<DesfireEv2>) -> Result<()> {
        self.session = None;

        // second parameter byte is the (empty) PCDcap2 length
        let rnd_b = self.auth_challenge(ins::AUTHENTICATE_EV2_FIRST, &[key_no, 0x00], key)?;
        let rnd_b_rot = util::rotate_left(&rnd_b);

        let mut rnd_a = [0u8; 16];
        rand::rng().fill_bytes(&mut rnd_a);

        let payload = self.auth_proof(key, &rnd_a, &rnd_b_rot)?;
        if payload.len() != 32 {
            return Err(Error::AuthenticationFailed("unexpected card proof length"));
        }

        let mut transaction_id = [0u8; 4];
        transaction_id.copy_from_slice(&payload[0..4]);
        let mut rnd_a_rot = [0u8; 16];
        rnd_a_rot.copy_from_slice(&payload[4..20]);
        if util::rotate_right(&rnd_a_rot) != rnd_a {
            warn!("card failed to prove knowledge of the authentication key");
            return Err(Error::AuthenticationFailed("card proof mismatch"));
        }
        let mut pd_cap2 = [0u8; 6];
        pd_cap2.copy_from_slice(&payload[20..26]);
        let mut pcd_cap2 = [0u8; 6];
        pcd_cap2.copy_from_slice(&payload[26..32]);

        let (enc, mac) = crypto::derive_session_keys(key, &rnd_a, &rnd_b);
        self.session = Some(Session::new(
            Keys::new(enc, mac),
            key_no,
            transaction_id,
            pd_cap2,
            pcd_cap2,
        ));
        debug!(key_no, "EV2First authentication established");
        Ok(())
    }

    /// Run `AuthenticateEV2NonFirst` to switch keys inside the transaction
    /// opened by a prior [`Self::authenticate_ev2_first`].
    ///
    /// The transaction identifier and command counter carry over; only the
    /// session keys are replaced. On any failure all session state is
    /// cleared, including the carried-over transaction.
    pub fn authenticate_ev2_non_first(&mut self, key_no: u8, key: &Key<DesfireEv2>) -> Result<()> {
        let previous = self.session.take().ok_or(Error::NotAuthenticated)?;

        let rnd_b = self.auth_challenge(ins::AUTHENTICATE_EV2_NON_FIRST, &[key_no], key)?;
        let rnd_b_rot = util::rotate_left(&rnd_b);

        let mut rnd_a = [0u8; 16];
        rand::rng().fill_bytes(&mut rnd_a);

        let payload = self.auth_proof(key, &rnd_a, &rnd_b_rot)?;
        if payload.len() != 16 {
            return Err(Error::AuthenticationFailed("unexpected card proof length"));
        }

        let mut rnd_a_rot = [0u8; 16];
        rnd_a_rot.copy_from_slice(&payload[0..16]);
        if util::rotate_right(&rnd_a_rot) != rnd_a {
            warn!("card failed to prove knowledge of the authentication key");
            return Err(Error::AuthenticationFailed("card proof mismatch"));
        }

        let (enc, mac) = crypto::derive_session_keys(key, &rnd_a, &rnd_b);
        self.session = Some(previous.resumed(Keys::new(enc, mac), key_no));
        debug!(key_no, "EV2NonFirst authentication established");
        Ok(())
    }

    /// Read from a standard or backup data file in full communication mode
    pub fn read_standard_file(&mut self, file_no: u8, offset: u32, length: u32) -> Result<Bytes> {
        if length == 0 {
            return Err(Error::InvalidArgument("read length must be non-zero"));
        }
        let data = self.execute(&ReadDataCommand::new(file_no, offset, length))?;
        if data.len() < length as usize {
            return Err(Error::InvalidResponseData("short read"));
        }
        Ok(data.slice(..length as usize))
    }

    /// Write to a standard or backup data file in full communication mode
    pub fn write_standard_file(&mut self, file_no: u8, offset: u32, data: &[u8]) -> Result<()> {
        check_frame_data(data)?;
        self.execute(&WriteDataCommand::new(
            file_no,
            offset,
            Bytes::copy_from_slice(data),
        ))?;
        Ok(())
    }

    /// Read records from a linear or cyclic record file in full
    /// communication mode. `record_size` is the file's configured record
    /// size, used to trim the decrypted padding.
    pub fn read_records(
        &mut self,
        file_no: u8,
        record_no: u32,
        record_count: u32,
        record_size: u32,
    ) -> Result<Bytes> {
        if record_count == 0 || record_size == 0 {
            return Err(Error::InvalidArgument("record count and size must be non-zero"));
        }
        let length = record_count
            .checked_mul(record_size)
            .ok_or(Error::InvalidArgument("record read length overflows"))?
            as usize;
        let data = self.execute(&ReadRecordsCommand::new(file_no, record_no, record_count))?;
        if data.len() < length {
            return Err(Error::InvalidResponseData("short record read"));
        }
        Ok(data.slice(..length))
    }

    /// Write one record to a linear or cyclic record file in full
    /// communication mode
    pub fn write_record(&mut self, file_no: u8, offset: u32, data: &[u8]) -> Result<()> {
        check_frame_data(data)?;
        self.execute(&WriteRecordCommand::new(
            file_no,
            offset,
            Bytes::copy_from_slice(data),
        ))?;
        Ok(())
    }

    /// Commit the current transaction. With `return_tmac` the card reports
    /// the updated transaction MAC counter and value, if the application
    /// has a transaction MAC file.
    pub fn commit_transaction(&mut self, return_tmac: bool) -> Result<Option<TransactionMac>> {
        let data = self.execute(&CommitTransactionCommand::new(return_tmac))?;
        if data.is_empty() {
            Ok(None)
        } else {
            Ok(Some(TransactionMac::try_from(data.as_ref())?))
        }
    }

    /// Create a transaction MAC file with an AES transaction MAC key
    pub fn create_transaction_mac_file(
        &mut self,
        file_no: u8,
        comm_mode: CommunicationMode,
        key: &Key<DesfireEv2>,
        key_version: u8,
    ) -> Result<()> {
        self.execute(&CreateTransactionMacFileCommand::new(
            file_no,
            comm_mode,
            *key,
            key_version,
        ))?;
        Ok(())
    }

    /// Delete the application's transaction MAC file
    pub fn delete_transaction_mac_file(&mut self, file_no: u8) -> Result<()> {
        self.execute(&DeleteTransactionMacFileCommand::new(file_no))?;
        Ok(())
    }

    /// Read the card's real 7-byte UID, only available inside a session
    pub fn get_card_uid(&mut self) -> Result<CardUid> {
        let data = self.execute(&GetCardUidCommand)?;
        let length = util::unpad_method2(&data)
            .ok_or(Error::InvalidResponseData("malformed UID padding"))?;
        if length != 7 {
            return Err(Error::InvalidResponseData("unexpected UID length"));
        }
        let mut uid = [0u8; 7];
        uid.copy_from_slice(&data[0..7]);
        Ok(CardUid::new(uid))
    }

    /// Fetch a file's settings. This is a plain command: it needs no
    /// session and does not touch the command counter.
    pub fn get_file_settings(&mut self, file_no: u8) -> Result<FileSettings> {
        let (payload, sw) =
            self.exchange(ins::GET_FILE_SETTINGS, Bytes::copy_from_slice(&[file_no]))?;
        if sw != status::OPERATION_OK {
            warn!(status = %sw, "GetFileSettings rejected: {}", status::description(sw.sw2));
            return Err(Error::card(sw));
        }
        FileSettings::try_from(payload.unwrap_or_default())
    }

    /// First authentication pass: request and decrypt the card's challenge
    fn auth_challenge(
        &mut self,
        auth_ins: u8,
        parameter: &[u8],
        key: &Key<DesfireEv2>,
    ) -> Result<[u8; 16]> {
        let (payload, sw) = self.exchange(auth_ins, Bytes::copy_from_slice(parameter))?;
        if sw != status::ADDITIONAL_FRAME {
            warn!(status = %sw, "authentication challenge rejected: {}", status::description(sw.sw2));
            return Err(Error::AuthenticationFailed("challenge rejected"));
        }
        let payload = payload.unwrap_or_default();
        if payload.len() != 16 {
            return Err(Error::AuthenticationFailed("unexpected challenge length"));
        }

        let zero_iv = Iv::<DesfireEv2>::default();
        let mut buf = BytesMut::from(payload.as_ref());
        let rnd_b = crypto::decrypt(key, &zero_iv, &mut buf)?;

        let mut out = [0u8; 16];
        out.copy_from_slice(&rnd_b);
        Ok(out)
    }

    /// Second authentication pass: send our proof, decrypt the card's
    fn auth_proof(
        &mut self,
        key: &Key<DesfireEv2>,
        rnd_a: &[u8; 16],
        rnd_b_rot: &[u8; 16],
    ) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(32);
        buf.put_slice(rnd_a);
        buf.put_slice(rnd_b_rot);
        let zero_iv = Iv::<DesfireEv2>::default();
        let ciphertext = crypto::encrypt(key, &zero_iv, &mut buf);

        let (payload, sw) = self.exchange(ins::ADDITIONAL_FRAME, ciphertext)?;
        if sw != status::OPERATION_OK {
            warn!(status = %sw, "authentication proof rejected: {}", status::description(sw.sw2));
            return Err(Error::AuthenticationFailed("proof rejected"));
        }

        let mut buf = BytesMut::from(payload.unwrap_or_default().as_ref());
        Ok(crypto::decrypt(key, &zero_iv, &mut buf)?)
    }

    /// Run one secured command through the codec: encrypt, MAC, exchange,
    /// advance the counter, verify the response MAC and decrypt.
    fn execute<C: SecureCommand>(&mut self, command: &C) -> Result<Bytes> {
        let (keys, transaction_id, counter) = {
            let session = self.session.as_ref().ok_or(Error::NotAuthenticated)?;
            (
                session.keys().clone(),
                *session.transaction_id(),
                session.cmd_counter(),
            )
        };

        let header = command.header();
        let mut body = BytesMut::with_capacity(header.len() + 48);
        body.extend_from_slice(&header);
        if let Some(mut plaintext) = command.plaintext() {
            util::pad_method2(&mut plaintext);
            let iv = crypto::command_iv(keys.enc(), &transaction_id, counter);
            body.extend_from_slice(&crypto::encrypt(keys.enc(), &iv, &mut plaintext));
        }

        // MAC input: Ins || CmdCounter || TI || CmdHeader || encrypted data
        let mut mac_input = BytesMut::with_capacity(7 + body.len());
        mac_input.put_u8(C::INS);
        mac_input.put_slice(&util::u16_le(counter));
        mac_input.put_slice(&transaction_id);
        mac_input.extend_from_slice(&body);
        let mac = crypto::truncate_mac(&crypto::cmac(keys.mac(), &mac_input));
        body.put_slice(&mac);

        let (payload, sw) = self.exchange(C::INS, body.freeze())?;
        if sw != status::OPERATION_OK {
            warn!(status = %sw, "command rejected: {}", status::description(sw.sw2));
            return Err(Error::card(sw));
        }

        // the card advanced its counter by answering; mirror it before
        // checking the response MAC
        if let Some(session) = self.session.as_mut() {
            session.advance_counter();
        }
        let counter = counter.wrapping_add(1);

        let payload = payload.unwrap_or_default();
        if payload.len() < 8 {
            return Err(Error::InvalidResponseData("response MAC missing"));
        }
        let (data, received_mac) = payload.split_at(payload.len() - 8);

        // response MAC input: RC (00) || CmdCounter || TI || response data
        let mut mac_input = BytesMut::with_capacity(7 + data.len());
        mac_input.put_u8(0x00);
        mac_input.put_slice(&util::u16_le(counter));
        mac_input.put_slice(&transaction_id);
        if C::RESPONSE_MAC_OVER_PAYLOAD {
            mac_input.put_slice(data);
        }
        let expected = crypto::truncate_mac(&crypto::cmac(keys.mac(), &mac_input));
        if expected != received_mac {
            warn!("response MAC mismatch, response discarded");
            return Err(Error::ResponseMacMismatch);
        }

        if C::RESPONSE_ENCRYPTED {
            let iv = crypto::response_iv(keys.enc(), &transaction_id, counter);
            let mut ciphertext = BytesMut::from(data);
            Ok(crypto::decrypt(keys.enc(), &iv, &mut ciphertext)?)
        } else {
            Ok(Bytes::copy_from_slice(data))
        }
    }

    /// Wrap a native command, transmit it and split the response
    fn exchange(&mut self, native_ins: u8, data: Bytes) -> Result<(Option<Bytes>, StatusWord)> {
        let command = Command::new_with_data_and_le(cla::NATIVE, native_ins, 0x00, 0x00, data, 0x00);
        let request = command.to_bytes();
        debug!(command = %hex::encode_upper(&request), "transmit");

        let raw = self.transport.transmit_raw(&request).map_err(Error::Apdu)?;
        debug!(response = %hex::encode_upper(&raw), "receive");

        let response = Response::from_bytes(&raw).map_err(Error::Apdu)?;
        let (payload, sw) = response.into_parts();
        self.last_status = Some(sw);
        if sw.sw1 != status::SW1_NATIVE {
            warn!(status = %sw, "response outside the native status class");
        }
        Ok((payload, sw))
    }
}

/// Reject writes that cannot fit one secured frame
fn check_frame_data(data: &[u8]) -> Result<()> {
    if data.is_empty() {
        return Err(Error::InvalidArgument("write data must not be empty"));
    }
    if data.len() > MAX_FRAME_DATA {
        return Err(Error::InvalidArgument("data too long for a single frame"));
    }
    Ok(())
}
