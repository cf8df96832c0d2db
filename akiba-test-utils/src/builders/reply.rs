//! FILE reply data lines

/// Number of fields in a FILE reply for the masks the session sends
const FIELD_COUNT: usize = 41;

/// Builds the data line of a `220 FILE` reply
///
/// # Examples
///
/// ```rust
/// use akiba_test_utils::FileReplyBuilder;
///
/// let fields = FileReplyBuilder::new(1, 23)
///     .anime("Cowboy Bebop")
///     .episode("01", "Asteroid Blues")
///     .fields();
/// assert_eq!(fields.len(), 41);
/// assert_eq!(fields[29], "Cowboy Bebop");
/// ```
#[derive(Debug, Clone)]
pub struct FileReplyBuilder {
    fields: Vec<String>,
}

impl FileReplyBuilder {
    pub fn new(fid: u64, aid: u64) -> Self {
        let mut fields = vec![String::new(); FIELD_COUNT];
        fields[0] = fid.to_string();
        fields[1] = aid.to_string();
        fields[5] = "1".to_string();
        fields[18] = "mkv".to_string();
        Self { fields }
    }

    fn set(mut self, index: usize, value: impl Into<String>) -> Self {
        self.fields[index] = value.into();
        self
    }

    pub fn state(self, state: u16) -> Self {
        self.set(5, state.to_string())
    }

    pub fn size(self, size: u64) -> Self {
        self.set(6, size.to_string())
    }

    pub fn ed2k(self, ed2k: &str) -> Self {
        self.set(7, ed2k)
    }

    pub fn crc32(self, crc32: &str) -> Self {
        self.set(10, crc32)
    }

    pub fn filetype(self, filetype: &str) -> Self {
        self.set(18, filetype)
    }

    pub fn year(self, year: &str) -> Self {
        self.set(26, year)
    }

    pub fn anime(self, romaji: &str) -> Self {
        self.set(29, romaji)
    }

    pub fn episode(self, number: &str, name: &str) -> Self {
        self.set(35, number).set(36, name)
    }

    pub fn group(self, name: &str, short: &str) -> Self {
        self.set(39, name).set(40, short)
    }

    pub fn fields(self) -> Vec<String> {
        self.fields
    }
}
