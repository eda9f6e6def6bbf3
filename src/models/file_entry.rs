use time::OffsetDateTime;

/// Kind of a remote filesystem object, as reported by the leading character
/// of an `ls -l` or `stat %A` mode string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Directory,
    File,
    Symlink,
    Other,
}

impl FileKind {
    pub fn from_mode_char(c: char) -> FileKind {
        match c {
            'd' => FileKind::Directory,
            '-' => FileKind::File,
            'l' => FileKind::Symlink,
            _ => FileKind::Other,
        }
    }

    /// Short discriminator handed to the display layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Directory => "dir",
            FileKind::File => "file",
            FileKind::Symlink => "symlink",
            FileKind::Other => "other",
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, FileKind::Directory)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permissions {
    pub mode: u32,
    pub owner: String,
    pub group: String,
}

impl Permissions {
    pub fn new(mode: u32, owner: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            mode,
            owner: owner.into(),
            group: group.into(),
        }
    }

    /// Parses a symbolic mode such as `drwxr-sr-t` or `-rw-r--r--+`.
    ///
    /// The leading type character is optional. Returns `None` when the string
    /// is not a mode string at all.
    pub fn from_ls_string(symbolic: &str, owner: &str, group: &str) -> Option<Self> {
        parse_mode_bits(symbolic).map(|mode| Self::new(mode, owner, group))
    }

    /// Octal rendering, e.g. `0644` or `4755`.
    pub fn octal(&self) -> String {
        format!("{:04o}", self.mode & 0o7777)
    }
}

/// Returns the permission bits (including setuid, setgid and sticky) of a
/// symbolic mode string.
pub fn parse_mode_bits(symbolic: &str) -> Option<u32> {
    let symbolic = symbolic
        .strip_suffix(['+', '.', '@'])
        .unwrap_or(symbolic);
    let bytes = symbolic.as_bytes();
    let perms = match bytes.len() {
        10 if b"-dlcbps".contains(&bytes[0]) => &bytes[1..],
        9 => bytes,
        _ => return None,
    };

    let mut mode = 0u32;
    for (i, &c) in perms.iter().enumerate() {
        let shift = 3 * (2 - i / 3);
        let (special, marker) = match i / 3 {
            0 => (0o4000, b's'),
            1 => (0o2000, b's'),
            _ => (0o1000, b't'),
        };
        match (i % 3, c) {
            (_, b'-') => {}
            (0, b'r') | (1, b'w') | (2, b'x') => mode |= (4u32 >> (i % 3)) << shift,
            (2, c) if c == marker => mode |= special | (1u32 << shift),
            (2, c) if c == marker.to_ascii_uppercase() => mode |= special,
            _ => return None,
        }
    }
    Some(mode)
}

/// One remote filesystem object.
///
/// Construction never validates `path`; the tree builder does that on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub path: String,
    pub kind: FileKind,
    pub size: Option<u64>,
    pub permissions: Option<Permissions>,
    pub modified: Option<OffsetDateTime>,
    pub accessed: Option<OffsetDateTime>,
    pub created: Option<OffsetDateTime>,
    pub inode: Option<u64>,
}

impl EntryInfo {
    pub fn new(path: impl Into<String>, kind: FileKind) -> Self {
        Self {
            path: path.into(),
            kind,
            size: None,
            permissions: None,
            modified: None,
            accessed: None,
            created: None,
            inode: None,
        }
    }

    pub fn file(path: impl Into<String>, size: u64) -> Self {
        Self::new(path, FileKind::File).with_size(size)
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self::new(path, FileKind::Directory)
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn with_modified(mut self, modified: OffsetDateTime) -> Self {
        self.modified = Some(modified);
        self
    }

    pub fn with_accessed(mut self, accessed: OffsetDateTime) -> Self {
        self.accessed = Some(accessed);
        self
    }

    pub fn with_created(mut self, created: OffsetDateTime) -> Self {
        self.created = Some(created);
        self
    }

    pub fn with_inode(mut self, inode: u64) -> Self {
        self.inode = Some(inode);
        self
    }

    /// Last path segment, or the path itself for `/`.
    pub fn name(&self) -> &str {
        match self.path.trim_end_matches('/').rsplit_once('/') {
            Some((_, name)) if !name.is_empty() => name,
            _ => &self.path,
        }
    }
}
