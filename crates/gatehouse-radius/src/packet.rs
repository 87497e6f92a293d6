//! RADIUS packet codec (RFC 2865).
//!
//! Covers what an authenticating client needs: building Access-Request
//! packets with a hidden User-Password, decoding responses and checking
//! the Response Authenticator. The server-side helpers
//! ([`Packet::encode_response`], [`reveal_password`]) exist so that
//! responders can be simulated.

use md5::{Digest, Md5};
use subtle::ConstantTimeEq;

pub const HEADER_LEN: usize = 20;
pub const AUTHENTICATOR_LEN: usize = 16;
pub const MAX_PACKET_LEN: usize = 4096;

const MAX_ATTRIBUTE_VALUE_LEN: usize = 253;
const PASSWORD_BLOCK_LEN: usize = 16;
const MAX_PASSWORD_LEN: usize = 128;

/// Attribute type: User-Name.
pub const USER_NAME: u8 = 1;
/// Attribute type: User-Password.
pub const USER_PASSWORD: u8 = 2;
/// Attribute type: Reply-Message.
pub const REPLY_MESSAGE: u8 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    AccessRequest,
    AccessAccept,
    AccessReject,
    AccessChallenge,
    Other(u8),
}

impl From<u8> for Code {
    fn from(value: u8) -> Self {
        match value {
            1 => Code::AccessRequest,
            2 => Code::AccessAccept,
            3 => Code::AccessReject,
            11 => Code::AccessChallenge,
            other => Code::Other(other),
        }
    }
}

impl From<Code> for u8 {
    fn from(code: Code) -> Self {
        match code {
            Code::AccessRequest => 1,
            Code::AccessAccept => 2,
            Code::AccessReject => 3,
            Code::AccessChallenge => 11,
            Code::Other(other) => other,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PacketError {
    #[error("packet too short: {0} bytes")]
    TooShort(usize),

    #[error("declared length {declared} invalid for {actual} received bytes")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("encoded packet exceeds 4096 bytes")]
    TooLong,

    #[error("attribute {kind} value too long: {len} bytes")]
    AttributeTooLong { kind: u8, len: usize },

    #[error("malformed attribute at offset {offset}")]
    MalformedAttribute { offset: usize },

    #[error("password longer than 128 bytes")]
    PasswordTooLong,

    #[error("hidden password has invalid length {0}")]
    InvalidHiddenPassword(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub kind: u8,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub code: Code,
    pub identifier: u8,
    /// Request Authenticator for requests; Response Authenticator for
    /// decoded responses.
    pub authenticator: [u8; AUTHENTICATOR_LEN],
    pub attributes: Vec<Attribute>,
}

impl Packet {
    pub fn new(code: Code, identifier: u8, authenticator: [u8; AUTHENTICATOR_LEN]) -> Self {
        Self {
            code,
            identifier,
            authenticator,
            attributes: Vec::new(),
        }
    }

    /// Build an Access-Request carrying User-Name and a hidden
    /// User-Password.
    pub fn access_request(
        identifier: u8,
        authenticator: [u8; AUTHENTICATOR_LEN],
        secret: &[u8],
        username: &str,
        password: &str,
    ) -> Result<Self, PacketError> {
        let mut packet = Self::new(Code::AccessRequest, identifier, authenticator);
        packet.add(USER_NAME, username.as_bytes().to_vec())?;
        let hidden = hide_password(password.as_bytes(), secret, &authenticator)?;
        packet.add(USER_PASSWORD, hidden)?;
        Ok(packet)
    }

    pub fn add(&mut self, kind: u8, value: Vec<u8>) -> Result<(), PacketError> {
        if value.len() > MAX_ATTRIBUTE_VALUE_LEN {
            return Err(PacketError::AttributeTooLong {
                kind,
                len: value.len(),
            });
        }
        self.attributes.push(Attribute { kind, value });
        Ok(())
    }

    /// First value of the given attribute type.
    pub fn attribute(&self, kind: u8) -> Option<&[u8]> {
        self.attributes
            .iter()
            .find(|a| a.kind == kind)
            .map(|a| a.value.as_slice())
    }

    /// Serialize with the authenticator as stored.
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let len = HEADER_LEN
            + self
                .attributes
                .iter()
                .map(|a| 2 + a.value.len())
                .sum::<usize>();
        if len > MAX_PACKET_LEN {
            return Err(PacketError::TooLong);
        }

        let mut out = Vec::with_capacity(len);
        out.push(u8::from(self.code));
        out.push(self.identifier);
        // len <= MAX_PACKET_LEN, fits in u16.
        out.extend_from_slice(&(len as u16).to_be_bytes());
        out.extend_from_slice(&self.authenticator);
        for attr in &self.attributes {
            if attr.value.len() > MAX_ATTRIBUTE_VALUE_LEN {
                return Err(PacketError::AttributeTooLong {
                    kind: attr.kind,
                    len: attr.value.len(),
                });
            }
            out.push(attr.kind);
            out.push((attr.value.len() + 2) as u8);
            out.extend_from_slice(&attr.value);
        }
        Ok(out)
    }

    /// Serialize as a response to a request with the given authenticator,
    /// computing the Response Authenticator.
    pub fn encode_response(
        &self,
        secret: &[u8],
        request_authenticator: &[u8; AUTHENTICATOR_LEN],
    ) -> Result<Vec<u8>, PacketError> {
        let mut out = self.encode()?;
        let auth = response_authenticator(&out, request_authenticator, secret);
        out[4..HEADER_LEN].copy_from_slice(&auth);
        Ok(out)
    }

    /// Parse a packet. Bytes past the declared length are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, PacketError> {
        if bytes.len() < HEADER_LEN {
            return Err(PacketError::TooShort(bytes.len()));
        }
        let declared = u16::from_be_bytes([bytes[2], bytes[3]]) as usize;
        if !(HEADER_LEN..=MAX_PACKET_LEN).contains(&declared) || declared > bytes.len() {
            return Err(PacketError::LengthMismatch {
                declared,
                actual: bytes.len(),
            });
        }

        let mut authenticator = [0u8; AUTHENTICATOR_LEN];
        authenticator.copy_from_slice(&bytes[4..HEADER_LEN]);

        let mut packet = Self::new(Code::from(bytes[0]), bytes[1], authenticator);
        let mut offset = HEADER_LEN;
        while offset < declared {
            if offset + 2 > declared {
                return Err(PacketError::MalformedAttribute { offset });
            }
            let kind = bytes[offset];
            let len = bytes[offset + 1] as usize;
            if len < 2 || offset + len > declared {
                return Err(PacketError::MalformedAttribute { offset });
            }
            packet.attributes.push(Attribute {
                kind,
                value: bytes[offset + 2..offset + len].to_vec(),
            });
            offset += len;
        }
        Ok(packet)
    }
}

/// Check that `raw` is an authentic response to the request with the
/// given identifier and authenticator. Comparison is constant-time.
pub fn verify_response(
    raw: &[u8],
    identifier: u8,
    request_authenticator: &[u8; AUTHENTICATOR_LEN],
    secret: &[u8],
) -> bool {
    if raw.len() < HEADER_LEN || raw[1] != identifier {
        return false;
    }
    let declared = u16::from_be_bytes([raw[2], raw[3]]) as usize;
    if !(HEADER_LEN..=raw.len()).contains(&declared) {
        return false;
    }
    let raw = &raw[..declared];
    let expected = response_authenticator(raw, request_authenticator, secret);
    bool::from(raw[4..HEADER_LEN].ct_eq(&expected))
}

/// MD5(Code | Identifier | Length | RequestAuth | Attributes | Secret).
fn response_authenticator(
    raw: &[u8],
    request_authenticator: &[u8; AUTHENTICATOR_LEN],
    secret: &[u8],
) -> [u8; AUTHENTICATOR_LEN] {
    let mut hasher = Md5::new();
    hasher.update(&raw[..4]);
    hasher.update(request_authenticator);
    hasher.update(&raw[HEADER_LEN..]);
    hasher.update(secret);
    hasher.finalize().into()
}

/// Hide a User-Password value (RFC 2865 §5.2).
///
/// The password is zero-padded to a multiple of 16 bytes and each block
/// XORed with MD5(secret | previous ciphertext block), the first block
/// chaining from the Request Authenticator.
pub fn hide_password(
    password: &[u8],
    secret: &[u8],
    authenticator: &[u8; AUTHENTICATOR_LEN],
) -> Result<Vec<u8>, PacketError> {
    if password.len() > MAX_PASSWORD_LEN {
        return Err(PacketError::PasswordTooLong);
    }
    let padded_len = password
        .len()
        .div_ceil(PASSWORD_BLOCK_LEN)
        .max(1)
        * PASSWORD_BLOCK_LEN;
    let mut out = password.to_vec();
    out.resize(padded_len, 0);

    for start in (0..padded_len).step_by(PASSWORD_BLOCK_LEN) {
        let mut hasher = Md5::new();
        hasher.update(secret);
        if start == 0 {
            hasher.update(authenticator);
        } else {
            hasher.update(&out[start - PASSWORD_BLOCK_LEN..start]);
        }
        let mask = hasher.finalize();
        for (byte, m) in out[start..start + PASSWORD_BLOCK_LEN].iter_mut().zip(mask) {
            *byte ^= m;
        }
    }
    Ok(out)
}

/// Recover a hidden User-Password; trailing zero padding is removed.
pub fn reveal_password(
    hidden: &[u8],
    secret: &[u8],
    authenticator: &[u8; AUTHENTICATOR_LEN],
) -> Result<Vec<u8>, PacketError> {
    if hidden.is_empty()
        || hidden.len() > MAX_PASSWORD_LEN
        || hidden.len() % PASSWORD_BLOCK_LEN != 0
    {
        return Err(PacketError::InvalidHiddenPassword(hidden.len()));
    }

    let mut out = Vec::with_capacity(hidden.len());
    for (i, block) in hidden.chunks(PASSWORD_BLOCK_LEN).enumerate() {
        let mut hasher = Md5::new();
        hasher.update(secret);
        if i == 0 {
            hasher.update(authenticator);
        } else {
            hasher.update(&hidden[(i - 1) * PASSWORD_BLOCK_LEN..i * PASSWORD_BLOCK_LEN]);
        }
        let mask = hasher.finalize();
        out.extend(block.iter().zip(mask).map(|(c, m)| c ^ m));
    }

    while out.last() == Some(&0) {
        out.pop();
    }
    Ok(out)
}
