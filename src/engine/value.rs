// Copyright © 2024 blitzbeaver contributors

use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};

use itertools::Itertools as _;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;
use xxhash_rust::xxh3::xxh3_64;

use super::error::{Error, Result};

/// A single token of text.
///
/// Edit distances work on extended grapheme clusters, so every word carries
/// a fingerprint per grapheme next to its raw text. Comparing two graphemes
/// is then a comparison of two integers.
#[derive(Clone)]
pub struct Word {
    raw: String,
    graphemes: Vec<u64>,
}

impl Word {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let graphemes = raw
            .graphemes(true)
            .map(|g| xxh3_64(g.as_bytes()))
            .collect();
        Self { raw, graphemes }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn graphemes(&self) -> &[u64] {
        &self.graphemes
    }

    /// Number of graphemes in the word.
    pub fn len(&self) -> usize {
        self.graphemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphemes.is_empty()
    }
}

impl PartialEq for Word {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Word {}

impl PartialOrd for Word {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Word {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl Hash for Word {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.raw)
    }
}

impl Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for Word {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Word {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    /// A single string.
    String,
    /// An ordered list of strings.
    MultiStrings,
}

/// A field value of a record.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub enum Element {
    #[default]
    None,
    Word(Word),
    MultiWords(Vec<Word>),
}

impl Element {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Kind of the element, `None` for absent values which conform to any field.
    pub fn kind(&self) -> Option<ElementKind> {
        match self {
            Self::None => None,
            Self::Word(_) => Some(ElementKind::String),
            Self::MultiWords(_) => Some(ElementKind::MultiStrings),
        }
    }

    /// All tokens of the element, in order.
    pub fn words(&self) -> &[Word] {
        match self {
            Self::None => &[],
            Self::Word(word) => std::slice::from_ref(word),
            Self::MultiWords(words) => words,
        }
    }

    /// Rebuilds the element with every token passed through `f`.
    #[must_use]
    pub fn map_words(&self, mut f: impl FnMut(&Word) -> Word) -> Self {
        match self {
            Self::None => Self::None,
            Self::Word(word) => Self::Word(f(word)),
            Self::MultiWords(words) => Self::MultiWords(words.iter().map(f).collect()),
        }
    }

    /// Human readable rendering of the tokens, used in diagnostics.
    pub fn to_strings(&self) -> Vec<String> {
        self.words().iter().map(|w| w.raw().to_string()).collect()
    }
}

impl Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Word(word) => write!(f, "{word:?}"),
            Self::MultiWords(words) => write!(f, "[{}]", words.iter().format(", ")),
        }
    }
}

impl From<&str> for Element {
    fn from(raw: &str) -> Self {
        Self::Word(Word::new(raw))
    }
}

impl From<String> for Element {
    fn from(raw: String) -> Self {
        Self::Word(Word::new(raw))
    }
}

impl From<Vec<&str>> for Element {
    fn from(raw: Vec<&str>) -> Self {
        Self::MultiWords(raw.into_iter().map(Word::new).collect())
    }
}

impl From<Vec<String>> for Element {
    fn from(raw: Vec<String>) -> Self {
        Self::MultiWords(raw.into_iter().map(Word::new).collect())
    }
}

impl<T> From<Option<T>> for Element
where
    T: Into<Element>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub kind: ElementKind,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered field descriptors shared by every record of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub fields: Vec<FieldSchema>,
}

impl RecordSchema {
    pub fn new(fields: Vec<FieldSchema>) -> Result<Self> {
        if fields.is_empty() {
            return Err(Error::EmptySchema);
        }
        Ok(Self { fields })
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, idx: usize) -> &FieldSchema {
        &self.fields[idx]
    }
}

/// A borrowed row of a frame.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    frame: &'a Frame,
    idx: usize,
}

impl<'a> Record<'a> {
    pub fn idx(&self) -> usize {
        self.idx
    }

    pub fn num_fields(&self) -> usize {
        self.frame.num_fields()
    }

    pub fn element(&self, field_idx: usize) -> &'a Element {
        &self.frame.columns[field_idx][self.idx]
    }

    pub fn elements(&self) -> impl Iterator<Item = &'a Element> + 'a {
        let frame = self.frame;
        let idx = self.idx;
        frame.columns.iter().map(move |column| &column[idx])
    }
}

/// One batch of records, stored column by column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    idx: usize,
    num_records: usize,
    columns: Vec<Vec<Element>>,
}

impl Frame {
    /// Builds a frame from rows, checking every row against the schema.
    pub fn from_records(
        idx: usize,
        schema: &RecordSchema,
        records: Vec<Vec<Element>>,
    ) -> Result<Self> {
        let num_records = records.len();
        let mut columns: Vec<Vec<Element>> = (0..schema.num_fields())
            .map(|_| Vec::with_capacity(num_records))
            .collect();

        for (record_idx, record) in records.into_iter().enumerate() {
            if record.len() != schema.num_fields() {
                return Err(Error::RecordWidthMismatch {
                    frame_idx: idx,
                    record_idx,
                    expected: schema.num_fields(),
                    actual: record.len(),
                });
            }
            for (field_idx, element) in record.into_iter().enumerate() {
                let field = schema.field(field_idx);
                if let Some(kind) = element.kind() {
                    if kind != field.kind {
                        return Err(Error::ElementKindMismatch {
                            frame_idx: idx,
                            record_idx,
                            field: field.name.clone(),
                            expected: field.kind,
                            actual: kind,
                        });
                    }
                }
                columns[field_idx].push(element);
            }
        }

        Ok(Self {
            idx,
            num_records,
            columns,
        })
    }

    /// Same frame with other column contents, used by normalization.
    pub(crate) fn with_columns(&self, columns: Vec<Vec<Element>>) -> Self {
        debug_assert_eq!(columns.len(), self.columns.len());
        Self {
            idx: self.idx,
            num_records: self.num_records,
            columns,
        }
    }

    pub fn idx(&self) -> usize {
        self.idx
    }

    pub fn num_records(&self) -> usize {
        self.num_records
    }

    pub fn num_fields(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_records == 0
    }

    pub fn column(&self, field_idx: usize) -> &[Element] {
        &self.columns[field_idx]
    }

    pub fn record(&self, idx: usize) -> Record<'_> {
        assert!(idx < self.num_records, "record index out of bounds");
        Record { frame: self, idx }
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        (0..self.num_records).map(move |idx| Record { frame: self, idx })
    }
}
