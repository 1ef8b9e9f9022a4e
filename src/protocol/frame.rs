//! HTTP/3 frame model (RFC 9114 §7).
//!
//! Every frame on the wire is a TLV:
//!
//! ```text
//! Frame {
//!   Type (varint),
//!   Length (varint),
//!   Payload (..)
//! }
//! ```

use bytes::Bytes;
use http::HeaderMap;
use serde::{Deserialize, Serialize};

/// Frame types that HTTP/2 used and HTTP/3 forbids (RFC 9114 §7.2.8).
///
/// Seeing one of these on the wire is a connection error of type
/// `H3_FRAME_UNEXPECTED`, and the encoder refuses to produce them.
pub const RESERVED_HTTP2_FRAME_TYPES: [u64; 4] = [0x02, 0x06, 0x08, 0x09];

/// First grease frame type (`0x1f * N + 0x21`, RFC 9114 §7.2.8).
pub const MIN_RESERVED_FRAME_TYPE: u64 = 0x21;

/// Last grease frame type that fits in a varint.
pub const MAX_RESERVED_FRAME_TYPE: u64 = 0x1f * (u32::MAX as u64) + 0x21;

/// Setting identifiers that HTTP/2 used and HTTP/3 forbids (RFC 9114 §7.2.4.1).
pub const RESERVED_HTTP2_SETTINGS: [u64; 5] = [0x00, 0x02, 0x03, 0x04, 0x05];

pub const SETTINGS_QPACK_MAX_TABLE_CAPACITY: u64 = 0x01;
pub const SETTINGS_MAX_FIELD_SECTION_SIZE: u64 = 0x06;
pub const SETTINGS_QPACK_BLOCKED_STREAMS: u64 = 0x07;

/// Is `frame_type` one of the HTTP/2 frame types that must never appear?
pub fn is_reserved_http2_frame_type(frame_type: u64) -> bool {
    RESERVED_HTTP2_FRAME_TYPES.contains(&frame_type)
}

/// Is `frame_type` a grease value (`0x1f * N + 0x21`)?
///
/// Grease types are legal on the wire and decode as [`Frame::Unknown`].
pub fn is_grease_frame_type(frame_type: u64) -> bool {
    frame_type >= MIN_RESERVED_FRAME_TYPE
        && frame_type <= MAX_RESERVED_FRAME_TYPE
        && (frame_type - MIN_RESERVED_FRAME_TYPE) % 0x1f == 0
}

/// Is `id` a setting identifier reserved from HTTP/2?
pub fn is_reserved_http2_setting(id: u64) -> bool {
    RESERVED_HTTP2_SETTINGS.contains(&id)
}

/// HTTP/3 frame types assigned by RFC 9114.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u64)]
pub enum FrameType {
    /// DATA frame (0x00) - carries request/response body
    Data = 0x00,
    /// HEADERS frame (0x01) - carries an encoded field section
    Headers = 0x01,
    /// CANCEL_PUSH frame (0x03) - cancels server push
    CancelPush = 0x03,
    /// SETTINGS frame (0x04) - carries connection settings
    Settings = 0x04,
    /// PUSH_PROMISE frame (0x05) - server push promise
    PushPromise = 0x05,
    /// GOAWAY frame (0x07) - graceful connection termination
    GoAway = 0x07,
    /// MAX_PUSH_ID frame (0x0D) - maximum push ID
    MaxPushId = 0x0d,
}

impl FrameType {
    /// Look up an assigned frame type.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0x00 => Some(FrameType::Data),
            0x01 => Some(FrameType::Headers),
            0x03 => Some(FrameType::CancelPush),
            0x04 => Some(FrameType::Settings),
            0x05 => Some(FrameType::PushPromise),
            0x07 => Some(FrameType::GoAway),
            0x0d => Some(FrameType::MaxPushId),
            _ => None,
        }
    }

    /// Wire value of this frame type.
    pub const fn code(self) -> u64 {
        self as u64
    }
}

impl From<FrameType> for u64 {
    fn from(frame_type: FrameType) -> Self {
        frame_type as u64
    }
}

/// Well-known HTTP/3 setting identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u64)]
pub enum SettingId {
    /// QPACK maximum table capacity
    QpackMaxTableCapacity = SETTINGS_QPACK_MAX_TABLE_CAPACITY,
    /// Maximum field section size
    MaxFieldSectionSize = SETTINGS_MAX_FIELD_SECTION_SIZE,
    /// QPACK blocked streams
    QpackBlockedStreams = SETTINGS_QPACK_BLOCKED_STREAMS,
}

impl SettingId {
    /// Look up a well-known identifier. Extension identifiers return `None`.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            SETTINGS_QPACK_MAX_TABLE_CAPACITY => Some(SettingId::QpackMaxTableCapacity),
            SETTINGS_MAX_FIELD_SECTION_SIZE => Some(SettingId::MaxFieldSectionSize),
            SETTINGS_QPACK_BLOCKED_STREAMS => Some(SettingId::QpackBlockedStreams),
            _ => None,
        }
    }
}

impl From<SettingId> for u64 {
    fn from(setting_id: SettingId) -> Self {
        setting_id as u64
    }
}

/// Ordered SETTINGS entries.
///
/// Entries keep insertion order so that encoding is deterministic. Inserting
/// an identifier that is already present replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    entries: Vec<(u64, u64)>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `id` to `value`, returning the previous value if there was one.
    pub fn insert(&mut self, id: impl Into<u64>, value: u64) -> Option<u64> {
        let id = id.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((id, value));
                None
            }
        }
    }

    pub fn get(&self, id: impl Into<u64>) -> Option<u64> {
        let id = id.into();
        self.entries
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|&(_, value)| value)
    }

    /// Iterate `(identifier, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<u64>> FromIterator<(K, u64)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut settings = Settings::new();
        for (id, value) in iter {
            settings.insert(id, value);
        }
        settings
    }
}

/// A single name/value field line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeaderField {
    pub name: Bytes,
    pub value: Bytes,
}

impl HeaderField {
    pub fn new(name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Field size as counted against `SETTINGS_MAX_FIELD_SECTION_SIZE`
    /// (RFC 9114 §4.2.2): name length + value length + 32.
    pub fn size(&self) -> u64 {
        (self.name.len() + self.value.len()) as u64 + 32
    }
}

/// Ordered list of field lines, duplicates allowed.
///
/// Unlike [`HeaderMap`], this keeps pseudo-header fields and the exact order
/// in which fields were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSection {
    fields: Vec<HeaderField>,
}

impl FieldSection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field line.
    pub fn push(&mut self, name: impl Into<Bytes>, value: impl Into<Bytes>) {
        self.fields.push(HeaderField::new(name, value));
    }

    /// All values carried under `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a [u8]) -> impl Iterator<Item = &'a Bytes> + 'a {
        self.fields
            .iter()
            .filter(move |field| field.name.as_ref() == name)
            .map(|field| &field.value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeaderField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Total size of the section (RFC 9114 §4.2.2).
    pub fn size(&self) -> u64 {
        self.fields.iter().map(HeaderField::size).sum()
    }
}

impl From<Vec<HeaderField>> for FieldSection {
    fn from(fields: Vec<HeaderField>) -> Self {
        Self { fields }
    }
}

impl FromIterator<HeaderField> for FieldSection {
    fn from_iter<I: IntoIterator<Item = HeaderField>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FieldSection {
    type Item = &'a HeaderField;
    type IntoIter = std::slice::Iter<'a, HeaderField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl From<&HeaderMap> for FieldSection {
    fn from(headers: &HeaderMap) -> Self {
        headers
            .iter()
            .map(|(name, value)| {
                HeaderField::new(
                    Bytes::copy_from_slice(name.as_str().as_bytes()),
                    Bytes::copy_from_slice(value.as_bytes()),
                )
            })
            .collect()
    }
}

/// An HTTP/3 frame.
///
/// Frames own their payload bytes. Handing a frame to the encoder moves it,
/// so the payload is released exactly once whether encoding succeeds or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// CANCEL_PUSH frame (0x03)
    CancelPush { push_id: u64 },

    /// DATA frame (0x00)
    Data { payload: Bytes },

    /// GOAWAY frame (0x07); a stream ID from the server, a push ID from the client
    GoAway { id: u64 },

    /// MAX_PUSH_ID frame (0x0D)
    MaxPushId { push_id: u64 },

    /// SETTINGS frame (0x04)
    Settings(Settings),

    /// HEADERS frame (0x01)
    Headers { fields: FieldSection },

    /// PUSH_PROMISE frame (0x05)
    PushPromise { push_id: u64, fields: FieldSection },

    /// Any other non-reserved frame type, payload carried verbatim
    Unknown { frame_type: u64, payload: Bytes },
}

impl Frame {
    /// Wire type of this frame.
    pub fn frame_type(&self) -> u64 {
        match self {
            Frame::CancelPush { .. } => FrameType::CancelPush.code(),
            Frame::Data { .. } => FrameType::Data.code(),
            Frame::GoAway { .. } => FrameType::GoAway.code(),
            Frame::MaxPushId { .. } => FrameType::MaxPushId.code(),
            Frame::Settings(_) => FrameType::Settings.code(),
            Frame::Headers { .. } => FrameType::Headers.code(),
            Frame::PushPromise { .. } => FrameType::PushPromise.code(),
            Frame::Unknown { frame_type, .. } => *frame_type,
        }
    }

    /// Assigned frame type, or `None` for [`Frame::Unknown`].
    pub fn kind(&self) -> Option<FrameType> {
        match self {
            Frame::Unknown { .. } => None,
            _ => FrameType::from_code(self.frame_type()),
        }
    }
}
