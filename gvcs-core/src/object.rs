//! Object model for gvcs
//!
//! Implements the four content-addressed object types (Blob, Tree, Commit,
//! Tag), their canonical payload encodings, and the framed record format
//! that digests are computed over.

use sha1::{Digest, Sha1};
use std::fmt;

/// Length of a digest in raw bytes (SHA-1).
pub const DIGEST_LEN: usize = 20;

/// Unique identifier for any stored object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; DIGEST_LEN]);

impl ObjectId {
    /// Create a new ObjectId from raw bytes
    pub fn new(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Compute ObjectId from data
    pub fn from_data(data: &[u8]) -> Self {
        let hash = Sha1::digest(data);
        Self(hash.into())
    }

    /// Convert to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hexadecimal string
    pub fn from_hex(hex_str: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex_str)?;
        if bytes.len() != DIGEST_LEN {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; DIGEST_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Object type discriminator
///
/// The set is closed: it is fixed by the stored-record wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    /// The ASCII tag written into the record header
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }

    /// Parse a record header tag; `None` for anything outside the closed set
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"blob" => Some(Self::Blob),
            b"tree" => Some(Self::Tree),
            b"commit" => Some(Self::Commit),
            b"tag" => Some(Self::Tag),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Failure to decode a variant payload
#[derive(Debug, thiserror::Error)]
#[error("malformed {kind} payload: {reason}")]
pub struct DecodeError {
    /// Variant whose decoder rejected the payload
    pub kind: ObjectKind,
    /// Human-readable description of the defect
    pub reason: String,
}

impl DecodeError {
    fn new(kind: ObjectKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// File content object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// Raw content data
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Payload is the content verbatim
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Decode from payload bytes (never fails; blobs are opaque)
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }
}

/// Directory tree entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// File mode as octal ASCII, e.g. "100644" or "40000"
    pub mode: String,
    /// Target object digest (Blob or Tree)
    pub id: ObjectId,
    /// Name of the entry
    pub name: String,
}

impl TreeEntry {
    /// Create a new tree entry
    pub fn new(mode: impl Into<String>, id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            id,
            name: name.into(),
        }
    }

    /// Whether this entry points at a subtree
    pub fn is_tree(&self) -> bool {
        self.mode.starts_with("40")
    }

    /// Sort key: raw name bytes, with a path separator appended for
    /// subtrees so a file and a like-named directory order the same way
    /// in every implementation.
    fn sort_key(&self) -> Vec<u8> {
        let mut key = self.name.clone().into_bytes();
        if self.is_tree() {
            key.push(b'/');
        }
        key
    }
}

/// Directory object
///
/// Entries are held in canonical order at all times so that encoding is
/// deterministic and equal trees hash identically.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add or replace an entry, keeping canonical order
    pub fn insert(&mut self, entry: TreeEntry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.name == entry.name) {
            *existing = entry;
            self.entries.sort_by_key(|e| e.sort_key());
            return;
        }
        let key = entry.sort_key();
        let idx = self
            .entries
            .partition_point(|e| e.sort_key() < key);
        self.entries.insert(idx, entry);
    }

    /// Get an entry by name
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Iterate over entries in canonical order
    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode as one newline-terminated line per entry:
    /// `<mode> SP <digest-hex> SP <name>`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            out.extend_from_slice(entry.mode.as_bytes());
            out.push(b' ');
            out.extend_from_slice(entry.id.to_hex().as_bytes());
            out.push(b' ');
            out.extend_from_slice(entry.name.as_bytes());
            out.push(b'\n');
        }
        out
    }

    /// Decode from payload bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        let malformed = |reason: &str| DecodeError::new(ObjectKind::Tree, reason);

        let mut tree = Self::new();
        let mut rest = data;
        while !rest.is_empty() {
            let nl = rest
                .iter()
                .position(|&b| b == b'\n')
                .ok_or_else(|| malformed("unterminated entry"))?;
            let line = &rest[..nl];
            rest = &rest[nl + 1..];

            let line = std::str::from_utf8(line)
                .map_err(|_| malformed("entry is not valid UTF-8"))?;
            let (mode, remainder) = line
                .split_once(' ')
                .ok_or_else(|| malformed("entry missing mode separator"))?;
            if mode.is_empty() || !mode.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed(&format!("invalid mode {mode:?}")));
            }
            let (hex, name) = remainder
                .split_once(' ')
                .ok_or_else(|| malformed("entry missing digest separator"))?;
            let id = ObjectId::from_hex(hex)
                .map_err(|_| malformed(&format!("invalid digest {hex:?}")))?;
            if name.is_empty() {
                return Err(malformed("empty entry name"));
            }
            // Stored trees are trusted to be in canonical order already;
            // entries are appended as-is so decode(encode(t)) == t holds.
            tree.entries.push(TreeEntry::new(mode, id, name));
        }
        Ok(tree)
    }
}

/// Author/committer/tagger identity with timestamp and timezone offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    /// Seconds since the Unix epoch
    pub when: i64,
    /// Timezone offset from UTC, in minutes (may be negative)
    pub tz_offset_minutes: i32,
}

impl Signature {
    /// Create a signature with an explicit timestamp
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        when: i64,
        tz_offset_minutes: i32,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            when,
            tz_offset_minutes,
        }
    }

    /// Create a signature stamped with the current local time
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = chrono::Local::now();
        Self::new(
            name,
            email,
            now.timestamp(),
            now.offset().local_minus_utc() / 60,
        )
    }

    /// Parse the wire form `Name <email> <epoch> <±HHMM>`
    pub fn parse(s: &str) -> Option<Self> {
        let lt = s.find('<')?;
        let gt = s[lt..].find('>')? + lt;
        let name = s[..lt].trim_end();
        let email = &s[lt + 1..gt];
        let mut rest = s[gt + 1..].split_whitespace();
        let when = rest.next()?.parse::<i64>().ok()?;
        let tz = rest.next()?;
        if rest.next().is_some() {
            return None;
        }
        let tz_offset_minutes = parse_tz_offset(tz)?;
        Some(Self::new(name, email, when, tz_offset_minutes))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.tz_offset_minutes;
        let sign = if total < 0 { '-' } else { '+' };
        let abs = total.unsigned_abs();
        write!(
            f,
            "{} <{}> {} {}{:02}{:02}",
            self.name,
            self.email,
            self.when,
            sign,
            abs / 60,
            abs % 60
        )
    }
}

fn parse_tz_offset(tz: &str) -> Option<i32> {
    let bytes = tz.as_bytes();
    if bytes.len() != 5 || !bytes[1..].iter().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let hours: i32 = tz[1..3].parse().ok()?;
    let minutes: i32 = tz[3..5].parse().ok()?;
    Some(sign * (hours * 60 + minutes))
}

/// Commit object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Root tree digest for this commit
    pub tree: ObjectId,
    /// Parent commit digests (empty for an initial commit)
    pub parents: Vec<ObjectId>,
    pub author: Signature,
    pub committer: Signature,
    /// Headers this system does not interpret, preserved in order
    pub extra: Vec<(String, String)>,
    /// Free-form message following the blank separator line
    pub message: String,
}

impl Commit {
    /// Create a new commit
    pub fn new(
        tree: ObjectId,
        parents: Vec<ObjectId>,
        author: Signature,
        committer: Signature,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tree,
            parents,
            author,
            committer,
            extra: Vec::new(),
            message: message.into(),
        }
    }

    /// Check if this is an initial commit (no parents)
    pub fn is_initial(&self) -> bool {
        self.parents.is_empty()
    }

    /// Encode as header lines, a blank line, then the message
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push_header(&mut out, "tree", &self.tree.to_hex());
        for parent in &self.parents {
            push_header(&mut out, "parent", &parent.to_hex());
        }
        push_header(&mut out, "author", &self.author.to_string());
        push_header(&mut out, "committer", &self.committer.to_string());
        for (key, value) in &self.extra {
            push_header(&mut out, key, value);
        }
        out.push(b'\n');
        out.extend_from_slice(self.message.as_bytes());
        out
    }

    /// Decode from payload bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        let kind = ObjectKind::Commit;
        let (headers, message) = parse_header_block(kind, data)?;

        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;
        let mut extra = Vec::new();
        for (key, value) in headers {
            if key == "tree" {
                let digest = parse_digest(kind, &key, &value)?;
                set_once(kind, &mut tree, digest)?;
            } else if key == "parent" {
                parents.push(parse_digest(kind, &key, &value)?);
            } else if key == "author" {
                let signature = parse_signature(kind, &key, &value)?;
                set_once(kind, &mut author, signature)?;
            } else if key == "committer" {
                let signature = parse_signature(kind, &key, &value)?;
                set_once(kind, &mut committer, signature)?;
            } else {
                extra.push((key, value));
            }
        }

        Ok(Self {
            tree: require(kind, tree, "tree")?,
            parents,
            author: require(kind, author, "author")?,
            committer: require(kind, committer, "committer")?,
            extra,
            message,
        })
    }
}

/// Annotated tag object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Digest of the object being tagged
    pub target: ObjectId,
    /// Declared type of the target
    pub target_kind: ObjectKind,
    /// Tag name
    pub name: String,
    pub tagger: Signature,
    /// Headers this system does not interpret, preserved in order
    pub extra: Vec<(String, String)>,
    pub message: String,
}

impl Tag {
    /// Create a new tag
    pub fn new(
        target: ObjectId,
        target_kind: ObjectKind,
        name: impl Into<String>,
        tagger: Signature,
        message: impl Into<String>,
    ) -> Self {
        Self {
            target,
            target_kind,
            name: name.into(),
            tagger,
            extra: Vec::new(),
            message: message.into(),
        }
    }

    /// Encode as header lines, a blank line, then the message
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push_header(&mut out, "object", &self.target.to_hex());
        push_header(&mut out, "type", self.target_kind.tag());
        push_header(&mut out, "tag", &self.name);
        push_header(&mut out, "tagger", &self.tagger.to_string());
        for (key, value) in &self.extra {
            push_header(&mut out, key, value);
        }
        out.push(b'\n');
        out.extend_from_slice(self.message.as_bytes());
        out
    }

    /// Decode from payload bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        let kind = ObjectKind::Tag;
        let (headers, message) = parse_header_block(kind, data)?;

        let mut target = None;
        let mut target_kind = None;
        let mut name = None;
        let mut tagger = None;
        let mut extra = Vec::new();
        for (key, value) in headers {
            if key == "object" {
                let digest = parse_digest(kind, &key, &value)?;
                set_once(kind, &mut target, digest)?;
            } else if key == "type" {
                let parsed = ObjectKind::from_tag(value.as_bytes()).ok_or_else(|| {
                    DecodeError::new(kind, format!("invalid target type {value:?}"))
                })?;
                set_once(kind, &mut target_kind, parsed)?;
            } else if key == "tag" {
                set_once(kind, &mut name, value)?;
            } else if key == "tagger" {
                let signature = parse_signature(kind, &key, &value)?;
                set_once(kind, &mut tagger, signature)?;
            } else {
                extra.push((key, value));
            }
        }

        Ok(Self {
            target: require(kind, target, "object")?,
            target_kind: require(kind, target_kind, "type")?,
            name: require(kind, name, "tag")?,
            tagger: require(kind, tagger, "tagger")?,
            extra,
            message,
        })
    }
}

/// Generic object that can be any variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Tag(Tag),
}

impl Object {
    /// Get the object kind
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Blob(_) => ObjectKind::Blob,
            Object::Tree(_) => ObjectKind::Tree,
            Object::Commit(_) => ObjectKind::Commit,
            Object::Tag(_) => ObjectKind::Tag,
        }
    }

    /// Canonical variant payload
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Object::Blob(blob) => blob.to_bytes(),
            Object::Tree(tree) => tree.to_bytes(),
            Object::Commit(commit) => commit.to_bytes(),
            Object::Tag(tag) => tag.to_bytes(),
        }
    }

    /// Dispatch a payload to the matching variant decoder
    pub fn from_bytes(kind: ObjectKind, data: &[u8]) -> Result<Self, DecodeError> {
        Ok(match kind {
            ObjectKind::Blob => Object::Blob(Blob::from_bytes(data)),
            ObjectKind::Tree => Object::Tree(Tree::from_bytes(data)?),
            ObjectKind::Commit => Object::Commit(Commit::from_bytes(data)?),
            ObjectKind::Tag => Object::Tag(Tag::from_bytes(data)?),
        })
    }

    /// Framed record: `<tag> SP <decimal-length> NUL <payload>`.
    /// The digest is computed over these bytes, uncompressed.
    pub fn to_record(&self) -> Vec<u8> {
        let payload = self.to_bytes();
        let mut record = Vec::with_capacity(payload.len() + 16);
        record.extend_from_slice(self.kind().tag().as_bytes());
        record.push(b' ');
        record.extend_from_slice(payload.len().to_string().as_bytes());
        record.push(0);
        record.extend_from_slice(&payload);
        record
    }

    /// Compute the content-addressed id for this object
    pub fn id(&self) -> ObjectId {
        ObjectId::from_data(&self.to_record())
    }
}

fn push_header(out: &mut Vec<u8>, key: &str, value: &str) {
    out.extend_from_slice(key.as_bytes());
    out.push(b' ');
    // Multi-line values fold with a leading space on continuation lines.
    out.extend_from_slice(value.replace('\n', "\n ").as_bytes());
    out.push(b'\n');
}

/// Split a commit/tag payload into its ordered header list and message.
fn parse_header_block(
    kind: ObjectKind,
    data: &[u8],
) -> Result<(Vec<(String, String)>, String), DecodeError> {
    let text = std::str::from_utf8(data)
        .map_err(|_| DecodeError::new(kind, "payload is not valid UTF-8"))?;
    let (block, message) = match text.split_once("\n\n") {
        Some((block, message)) => (block, message),
        None => {
            return Err(DecodeError::new(
                kind,
                "missing blank line after headers",
            ));
        }
    };

    let mut headers: Vec<(String, String)> = Vec::new();
    for line in block.split('\n') {
        if let Some(continuation) = line.strip_prefix(' ') {
            let (_, value) = headers.last_mut().ok_or_else(|| {
                DecodeError::new(kind, "continuation line before any header")
            })?;
            value.push('\n');
            value.push_str(continuation);
            continue;
        }
        let (key, value) = line
            .split_once(' ')
            .ok_or_else(|| DecodeError::new(kind, format!("malformed header line {line:?}")))?;
        headers.push((key.to_string(), value.to_string()));
    }
    Ok((headers, message.to_string()))
}

fn parse_digest(kind: ObjectKind, key: &str, value: &str) -> Result<ObjectId, DecodeError> {
    ObjectId::from_hex(value)
        .map_err(|_| DecodeError::new(kind, format!("invalid {key} digest {value:?}")))
}

fn parse_signature(kind: ObjectKind, key: &str, value: &str) -> Result<Signature, DecodeError> {
    Signature::parse(value)
        .ok_or_else(|| DecodeError::new(kind, format!("invalid {key} signature {value:?}")))
}

fn set_once<T>(kind: ObjectKind, slot: &mut Option<T>, value: T) -> Result<(), DecodeError> {
    if slot.is_some() {
        return Err(DecodeError::new(kind, "duplicate header"));
    }
    *slot = Some(value);
    Ok(())
}

fn require<T>(kind: ObjectKind, slot: Option<T>, key: &str) -> Result<T, DecodeError> {
    slot.ok_or_else(|| DecodeError::new(kind, format!("missing required {key} header")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_object_id_roundtrip() {
        let bytes = [42u8; DIGEST_LEN];
        let id = ObjectId::new(bytes);
        let hex = id.to_hex();
        let id2 = ObjectId::from_hex(&hex).unwrap();
        assert_eq!(id, id2);
    }

    #[test]
    fn test_object_id_rejects_short_hex() {
        assert!(ObjectId::from_hex("ce0136").is_err());
    }

    #[test]
    fn test_blob_known_digest() {
        // SHA-1 of "blob 6\0hello\n"
        let blob = Object::Blob(Blob::new(b"hello\n".to_vec()));
        assert_eq!(
            blob.id().to_hex(),
            "ce013625030ba8dba906f756967f9e9ca394464b"
        );
        assert_eq!(blob.to_record(), b"blob 6\0hello\n".to_vec());
    }

    #[test]
    fn test_tree_orders_directory_after_like_named_file() {
        let id = ObjectId::new([0u8; DIGEST_LEN]);
        let mut tree = Tree::new();
        tree.insert(TreeEntry::new("40000", id, "foo"));
        tree.insert(TreeEntry::new("100644", id, "foo.bar"));
        tree.insert(TreeEntry::new("100644", id, "foo-baz"));

        // "foo" as a directory sorts as "foo/", after both file names.
        let names: Vec<&str> = tree.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["foo-baz", "foo.bar", "foo"]);
    }

    #[test]
    fn test_tree_insert_replaces_same_name() {
        let id = ObjectId::new([7u8; DIGEST_LEN]);
        let mut tree = Tree::new();
        tree.insert(TreeEntry::new("100644", ObjectId::new([0u8; DIGEST_LEN]), "a.txt"));
        tree.insert(TreeEntry::new("100755", id, "a.txt"));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("a.txt").unwrap().id, id);
        assert_eq!(tree.get("a.txt").unwrap().mode, "100755");
    }

    #[test]
    fn test_tree_roundtrip() {
        let mut tree = Tree::new();
        tree.insert(TreeEntry::new(
            "100644",
            ObjectId::new([1u8; DIGEST_LEN]),
            "name with spaces.txt",
        ));
        tree.insert(TreeEntry::new("40000", ObjectId::new([2u8; DIGEST_LEN]), "src"));
        let decoded = Tree::from_bytes(&tree.to_bytes()).unwrap();
        assert_eq!(decoded, tree);
    }

    #[test]
    fn test_tree_rejects_bad_digest() {
        let err = Tree::from_bytes(b"100644 nothexnothexnothexnothexnothexnoth x\n").unwrap_err();
        assert!(err.reason.contains("digest"));
    }

    #[test]
    fn test_tree_rejects_unterminated_entry() {
        let line = format!("100644 {} trailing", ObjectId::new([0u8; DIGEST_LEN]).to_hex());
        let err = Tree::from_bytes(line.as_bytes()).unwrap_err();
        assert_eq!(err.reason, "unterminated entry");
    }

    #[test]
    fn test_signature_roundtrip() {
        let sig = Signature::new("Ada Lovelace", "ada@example.org", 1_234_567_890, -330);
        let rendered = sig.to_string();
        assert_eq!(rendered, "Ada Lovelace <ada@example.org> 1234567890 -0530");
        assert_eq!(Signature::parse(&rendered).unwrap(), sig);
    }

    #[test]
    fn test_signature_rejects_missing_offset() {
        assert!(Signature::parse("Ada <ada@example.org> 1234567890").is_none());
    }

    #[test]
    fn test_commit_roundtrip() {
        let commit = Commit::new(
            ObjectId::new([1u8; DIGEST_LEN]),
            vec![ObjectId::new([2u8; DIGEST_LEN]), ObjectId::new([3u8; DIGEST_LEN])],
            Signature::new("Author", "a@example.org", 1_700_000_000, 120),
            Signature::new("Committer", "c@example.org", 1_700_000_100, 0),
            "Subject line\n\nBody paragraph.\n",
        );
        let decoded = Commit::from_bytes(&commit.to_bytes()).unwrap();
        assert_eq!(decoded, commit);
        assert!(!decoded.is_initial());
    }

    #[test]
    fn test_commit_preserves_folded_extra_header() {
        let mut commit = Commit::new(
            ObjectId::new([1u8; DIGEST_LEN]),
            vec![],
            Signature::new("A", "a@example.org", 0, 0),
            Signature::new("A", "a@example.org", 0, 0),
            "msg",
        );
        commit
            .extra
            .push(("gpgsig".to_string(), "-----BEGIN-----\nabcd\n-----END-----".to_string()));
        let bytes = commit.to_bytes();
        let decoded = Commit::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, commit);
    }

    #[test]
    fn test_commit_missing_tree_is_malformed() {
        let payload = b"author A <a@example.org> 0 +0000\ncommitter A <a@example.org> 0 +0000\n\nmsg";
        let err = Commit::from_bytes(payload).unwrap_err();
        assert!(err.reason.contains("tree"));
    }

    #[test]
    fn test_commit_missing_blank_line_is_malformed() {
        let payload = format!("tree {}\n", ObjectId::new([0u8; DIGEST_LEN]).to_hex());
        let err = Commit::from_bytes(payload.as_bytes()).unwrap_err();
        assert!(err.reason.contains("blank line"));
    }

    #[test]
    fn test_tag_roundtrip() {
        let tag = Tag::new(
            ObjectId::new([9u8; DIGEST_LEN]),
            ObjectKind::Commit,
            "v1.0",
            Signature::new("Tagger", "t@example.org", 1_700_000_000, -480),
            "Release 1.0\n",
        );
        let decoded = Tag::from_bytes(&tag.to_bytes()).unwrap();
        assert_eq!(decoded, tag);
    }

    #[test]
    fn test_tag_rejects_unknown_target_type() {
        let payload = format!(
            "object {}\ntype widget\ntag v1\ntagger T <t@example.org> 0 +0000\n\nmsg",
            ObjectId::new([0u8; DIGEST_LEN]).to_hex()
        );
        let err = Tag::from_bytes(payload.as_bytes()).unwrap_err();
        assert!(err.reason.contains("target type"));
    }

    proptest! {
        /// The dedup contract: byte-identical encodings imply identical
        /// records and identical digests.
        #[test]
        fn identical_payloads_collapse_to_one_digest(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let a = Object::Blob(Blob::new(data.clone()));
            let b = Object::Blob(Blob::new(data));
            prop_assert_eq!(a.to_bytes(), b.to_bytes());
            prop_assert_eq!(a.to_record(), b.to_record());
            prop_assert_eq!(a.id(), b.id());
        }
    }
}
