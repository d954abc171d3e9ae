//! SMBIOS string area decoding.
//!
//! Every structure's formatted part is followed by a sequence of
//! NUL-terminated strings, the sequence itself ending with an extra NUL.
//! Fields refer to these strings by 1-based index, 0 meaning "no string".

/// String area of one structure
#[derive(Debug, Clone, Copy)]
pub struct StringTable<'a> {
    data: &'a [u8],
}

impl<'a> StringTable<'a> {
    /// Wrap the bytes that follow a structure's formatted part
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Get the string with 1-based `index`, without its NUL
    ///
    /// Returns `None` for index 0, or when the double NUL (or the end of the
    /// area) comes before the `index`-th string.
    pub fn get(&self, index: u8) -> Option<&'a [u8]> {
        if index == 0 {
            return None;
        }
        self.iter().nth(index as usize - 1)
    }

    /// Get a string as UTF-8 text
    pub fn get_str(&self, index: u8) -> Option<&'a str> {
        core::str::from_utf8(self.get(index)?).ok()
    }

    /// Iterate strings in order
    pub fn iter(&self) -> StringTableIter<'a> {
        StringTableIter { data: self.data, pos: 0 }
    }

    /// Number of strings
    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

/// String table iterator
pub struct StringTableIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for StringTableIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.data.get(self.pos..)?;

        // An empty string here is the second NUL of the terminator
        let len = rest.iter().position(|&b| b == 0)?;
        if len == 0 {
            self.pos = self.data.len();
            return None;
        }

        self.pos += len + 1;
        Some(&rest[..len])
    }
}
