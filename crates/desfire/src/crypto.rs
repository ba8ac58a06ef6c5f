//! Cryptographic primitives for EV2 secure messaging
//!
//! AES-128 in CBC mode with explicit IVs (the protocol never uses the
//! cipher's internal padding) and AES-CMAC for session key derivation
//! and message authentication.

use aes::Aes128;
use aes::cipher::{
    BlockDecryptMut, BlockEncryptMut, Iv, IvSizeUser, Key, KeyIvInit, KeySizeUser,
    block_padding::{NoPadding, UnpadError},
    typenum::U16,
};
use bytes::{Bytes, BytesMut};
use cmac::{Cmac, Mac};

use crate::constants::label;

type Encryptor = cbc::Encryptor<Aes128>;
type Decryptor = cbc::Decryptor<Aes128>;

/// Cipher parameter marker for the EV2 secure channel
pub struct DesfireEv2;

impl KeySizeUser for DesfireEv2 {
    type KeySize = U16;
}

impl IvSizeUser for DesfireEv2 {
    type IvSize = U16;
}

/// Encrypt data in CBC mode with the given IV. The input must already be
/// padded to a multiple of the block size.
pub(crate) fn encrypt(key: &Key<DesfireEv2>, iv: &Iv<DesfireEv2>, data: &mut BytesMut) -> Bytes {
    let msg_len = data.len();
    // The protocol pads before encrypting, so the length is always block-aligned.
    let ciphertext = Encryptor::new(key, iv)
        .encrypt_padded_mut::<NoPadding>(data, msg_len)
        .unwrap();
    Bytes::copy_from_slice(ciphertext)
}

/// Decrypt data in CBC mode with the given IV. Fails if the ciphertext is
/// not a multiple of the block size.
pub(crate) fn decrypt(
    key: &Key<DesfireEv2>,
    iv: &Iv<DesfireEv2>,
    data: &mut BytesMut,
) -> Result<Bytes, UnpadError> {
    let plaintext = Decryptor::new(key, iv).decrypt_padded_mut::<NoPadding>(data)?;
    Ok(Bytes::copy_from_slice(plaintext))
}

/// Full 16-byte AES-CMAC over the message
pub(crate) fn cmac(key: &Key<DesfireEv2>, message: &[u8]) -> [u8; 16] {
    let mut mac = <Cmac<Aes128> as Mac>::new(key);
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// Truncate a full CMAC to the 8 odd-indexed bytes sent on the wire
pub(crate) fn truncate_mac(full: &[u8; 16]) -> [u8; 8] {
    core::array::from_fn(|i| full[2 * i + 1])
}

/// Derive the session encryption and MAC keys from the authentication key
/// and the exchanged random numbers (NIST SP 800-108 CMAC-based KDF).
pub(crate) fn derive_session_keys(
    auth_key: &Key<DesfireEv2>,
    rnd_a: &[u8; 16],
    rnd_b: &[u8; 16],
) -> (Key<DesfireEv2>, Key<DesfireEv2>) {
    let enc = kdf(auth_key, label::SESSION_ENC, rnd_a, rnd_b);
    let mac = kdf(auth_key, label::SESSION_MAC, rnd_a, rnd_b);
    (enc, mac)
}

fn kdf(
    auth_key: &Key<DesfireEv2>,
    label: [u8; 2],
    rnd_a: &[u8; 16],
    rnd_b: &[u8; 16],
) -> Key<DesfireEv2> {
    // SV = label || 0x0001 || 0x0080 || rndA[0..2]
    //    || (rndA[2..8] xor rndB[0..6]) || rndB[6..16] || rndA[8..16]
    let mut sv = [0u8; 32];
    sv[0..2].copy_from_slice(&label);
    sv[2..4].copy_from_slice(&label::KDF_COUNTER);
    sv[4..6].copy_from_slice(&label::KDF_LENGTH);
    sv[6..8].copy_from_slice(&rnd_a[0..2]);
    for i in 0..6 {
        sv[8 + i] = rnd_a[2 + i] ^ rnd_b[i];
    }
    sv[14..24].copy_from_slice(&rnd_b[6..16]);
    sv[24..32].copy_from_slice(&rnd_a[8..16]);

    cmac(auth_key, &sv).into()
}

/// IV for encrypting command data: E(K_enc, 0xA55A || TI || counter || zeros)
pub(crate) fn command_iv(
    enc_key: &Key<DesfireEv2>,
    transaction_id: &[u8; 4],
    counter: u16,
) -> Iv<DesfireEv2> {
    derive_iv(enc_key, label::IV_COMMAND, transaction_id, counter)
}

/// IV for decrypting response data: E(K_enc, 0x5AA5 || TI || counter || zeros)
pub(crate) fn response_iv(
    enc_key: &Key<DesfireEv2>,
    transaction_id: &[u8; 4],
    counter: u16,
) -> Iv<DesfireEv2> {
    derive_iv(enc_key, label::IV_RESPONSE, transaction_id, counter)
}

fn derive_iv(
    enc_key: &Key<DesfireEv2>,
    label: [u8; 2],
    transaction_id: &[u8; 4],
    counter: u16,
) -> Iv<DesfireEv2> {
    let mut input = BytesMut::zeroed(16);
    input[0..2].copy_from_slice(&label);
    input[2..6].copy_from_slice(transaction_id);
    input[6..8].copy_from_slice(&counter.to_le_bytes());

    let zero_iv = Iv::<DesfireEv2>::default();
    Iv::<DesfireEv2>::clone_from_slice(&encrypt(enc_key, &zero_iv, &mut input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_derive_session_keys() {
        let auth_key = Key::<DesfireEv2>::default();
        let rnd_a = hex!("B04D0787C93EE0CC8CACC8E86F16C6FE");
        let rnd_b = hex!("FA659AD0DCA738DD65DC7DC38612AD81");

        let (enc, mac) = derive_session_keys(&auth_key, &rnd_a, &rnd_b);

        assert_eq!(
            enc.as_slice(),
            hex!("63DC07286289A7A6C0334CA31C314A04")
        );
        assert_eq!(
            mac.as_slice(),
            hex!("774F26743ECE6AF5033B6AE8522946F6")
        );
    }

    #[test]
    fn test_command_iv_derivation() {
        let enc_key = Key::<DesfireEv2>::from(hex!("FFBCFE1F41840A09C9A88D0A4B10DF05"));
        let ti = hex!("CD73D8E5");

        let iv = command_iv(&enc_key, &ti, 0);
        assert_eq!(iv.as_slice(), hex!("871747AF36D72164A418BBFECCECD911"));
    }

    #[test]
    fn test_response_iv_derivation() {
        let enc_key = Key::<DesfireEv2>::from(hex!("C1D7BD9F60034D8432F9AF3403D573D0"));
        let ti = hex!("569D4B24");

        let iv = response_iv(&enc_key, &ti, 1);
        assert_eq!(iv.as_slice(), hex!("5A42ECB2111A9267FA5F2682523229AC"));
    }

    #[test]
    fn test_cmac_over_command() {
        let mac_key = Key::<DesfireEv2>::from(hex!("FD9E26C9766F07C1D07106C0F8F3671F"));
        let full = cmac(&mac_key, &hex!("510000569D4B24"));
        assert_eq!(full, hex!("ED5CB7A932EF8D7C2E91B42A1139F11B"));
    }

    #[test]
    fn test_truncate_mac() {
        let full = hex!("ED5CB7A932EF8D7C2E91B42A1139F11B");
        assert_eq!(truncate_mac(&full), hex!("5CA9EF7C912A391B"));
    }

    #[test]
    fn test_encrypt_padded_write_data() {
        let enc_key = Key::<DesfireEv2>::from(hex!("FFBCFE1F41840A09C9A88D0A4B10DF05"));
        let iv = Iv::<DesfireEv2>::from(hex!("871747AF36D72164A418BBFECCECD911"));

        // 25 data bytes plus method-2 padding
        let mut data = BytesMut::from(&[0x22u8; 25][..]);
        crate::util::pad_method2(&mut data);

        let ciphertext = encrypt(&enc_key, &iv, &mut data);
        assert_eq!(
            ciphertext.as_ref(),
            hex!("D7446FBC912580C0A65E738D28B609E43ADBB8FB2B4CA68744D1BBEBB37EBD32")
        );
    }

    #[test]
    fn test_decrypt_response_data() {
        let enc_key = Key::<DesfireEv2>::from(hex!("C1D7BD9F60034D8432F9AF3403D573D0"));
        let iv = Iv::<DesfireEv2>::from(hex!("5A42ECB2111A9267FA5F2682523229AC"));

        let mut ciphertext = BytesMut::from(&hex!("CDFFBF6D34231DA2789DA9D3AB15D560")[..]);
        let plaintext = decrypt(&enc_key, &iv, &mut ciphertext).unwrap();
        assert_eq!(
            plaintext.as_ref(),
            hex!("04DE5F1EACC040800000000000000000")
        );
    }

    #[test]
    fn test_decrypt_rejects_partial_block() {
        let enc_key = Key::<DesfireEv2>::default();
        let iv = Iv::<DesfireEv2>::default();
        let mut ciphertext = BytesMut::from(&[0xAAu8; 15][..]);
        assert!(decrypt(&enc_key, &iv, &mut ciphertext).is_err());
    }

    #[test]
    fn test_cbc_round_trip() {
        let key = Key::<DesfireEv2>::from(hex!("000102030405060708090A0B0C0D0E0F"));
        let iv = Iv::<DesfireEv2>::from(hex!("101112131415161718191A1B1C1D1E1F"));

        let original = [0x5Au8; 32];
        let mut buf = BytesMut::from(&original[..]);
        let ciphertext = encrypt(&key, &iv, &mut buf);
        assert_ne!(ciphertext.as_ref(), &original[..]);

        let mut buf = BytesMut::from(ciphertext.as_ref());
        let plaintext = decrypt(&key, &iv, &mut buf).unwrap();
        assert_eq!(plaintext.as_ref(), &original[..]);
    }
}
