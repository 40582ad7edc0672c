use byteorder::{ByteOrder, NativeEndian};
use std::fmt;

use super::compiler::PrepareError;

pub const COLUMN_USERNAME_SIZE: usize = 31;
pub const COLUMN_EMAIL_SIZE: usize = 255;

// String slots reserve one extra byte for the NUL terminator.
const ID_SIZE: usize = std::mem::size_of::<u32>();
const USERNAME_SIZE: usize = COLUMN_USERNAME_SIZE + 1;
const EMAIL_SIZE: usize = COLUMN_EMAIL_SIZE + 1;

const ID_OFFSET: usize = 0;
const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: u32,
    username: String,
    email: String,
}

impl Row {
    pub fn new(id: u32, username: &str, email: &str) -> Result<Self, PrepareError> {
        if username.len() > COLUMN_USERNAME_SIZE {
            return Err(PrepareError::UsernameTooLong);
        }
        if email.len() > COLUMN_EMAIL_SIZE {
            return Err(PrepareError::EmailTooLong);
        }
        // a NUL would end the field early on decode
        if username.contains('\0') || email.contains('\0') {
            return Err(PrepareError::SyntaxError);
        }
        Ok(Row {
            id,
            username: username.to_owned(),
            email: email.to_owned(),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Writes the row into `dest`, which must be at least `ROW_SIZE` bytes.
    pub fn serialize(&self, dest: &mut [u8]) {
        NativeEndian::write_u32(&mut dest[ID_OFFSET..USERNAME_OFFSET], self.id);
        write_fixed(&mut dest[USERNAME_OFFSET..EMAIL_OFFSET], &self.username);
        write_fixed(&mut dest[EMAIL_OFFSET..ROW_SIZE], &self.email);
    }

    pub fn deserialize(src: &[u8]) -> Self {
        Self {
            id: NativeEndian::read_u32(&src[ID_OFFSET..USERNAME_OFFSET]),
            username: read_fixed(&src[USERNAME_OFFSET..EMAIL_OFFSET]),
            email: read_fixed(&src[EMAIL_OFFSET..ROW_SIZE]),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

// The whole slot is cleared first so a shorter value never leaves bytes of a
// previous occupant behind the terminator.
fn write_fixed(slot: &mut [u8], value: &str) {
    slot.fill(0);
    let bytes = value.as_bytes();
    let len = bytes.len().min(slot.len() - 1);
    slot[..len].copy_from_slice(&bytes[..len]);
}

fn read_fixed(slot: &[u8]) -> String {
    let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    String::from_utf8_lossy(&slot[..end]).into_owned()
}
