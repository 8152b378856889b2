#![forbid(unsafe_code)]

use crate::error::Error;
use crate::shaping::ShapeSpec;
use crate::source::{Document, RecordSource, ShapedStream};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::iter;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    /// One document per line.
    Lines,
    /// A single document or an array of documents.
    Json,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("jsonl" | "ndjson") => Format::Lines,
            _ => Format::Json,
        }
    }
}

/// Match documents stored as JSON files, read in the order given.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    paths: Vec<PathBuf>,
}

impl JsonFileSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Expand glob patterns into files. Every pattern must match at least one
    /// file; matches of a pattern are sorted.
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self, Error> {
        let mut paths = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let mut matched = glob::glob(pattern)?
                .map(|entry| {
                    entry.map_err(|err| Error::Read {
                        path: err.path().to_path_buf(),
                        source: err.into_error(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if matched.is_empty() {
                return Err(Error::NoInput(pattern.to_owned()));
            }
            matched.sort();
            paths.extend(matched);
        }
        debug!(?paths, "input files");
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl RecordSource for JsonFileSource {
    fn query<'a>(&'a mut self, spec: &'a ShapeSpec) -> Result<ShapedStream<'a>, Error> {
        for path in &self.paths {
            let metadata = std::fs::metadata(path).map_err(|source| Error::Read {
                path: path.clone(),
                source,
            })?;
            if !metadata.is_file() {
                return Err(Error::NoInput(path.display().to_string()));
            }
        }
        let documents = self.paths.iter().flat_map(|path| read_documents(path));
        Ok(Box::new(spec.stream(documents)))
    }
}

fn read_documents(path: &Path) -> Box<dyn Iterator<Item = Result<Document, Error>>> {
    debug!(path = %path.display(), "reading match documents");
    match Format::of(path) {
        Format::Lines => match File::open(path) {
            Ok(file) => Box::new(read_lines(path.to_path_buf(), BufReader::new(file))),
            Err(source) => Box::new(iter::once(Err(Error::Read {
                path: path.to_path_buf(),
                source,
            }))),
        },
        Format::Json => match JsonElements::open(path) {
            Ok(elements) => Box::new(elements),
            Err(err) => Box::new(iter::once(Err(err))),
        },
    }
}

fn read_lines<R: BufRead>(
    path: PathBuf,
    reader: R,
) -> impl Iterator<Item = Result<Document, Error>> {
    reader
        .lines()
        .enumerate()
        .filter_map(move |(index, line)| match line {
            Err(source) => Some(Err(Error::Read {
                path: path.clone(),
                source,
            })),
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(Ok(Document::decode_str(&line, || {
                format!("{}:{}", path.display(), index + 1)
            }))),
        })
}

/// Documents of a file holding a single match or an array of matches.
///
/// The raw file is buffered, but array elements are parsed one at a time as
/// the iterator is pulled, so only one decoded match is alive at once.
struct JsonElements {
    path: PathBuf,
    bytes: Vec<u8>,
    pos: usize,
    index: usize,
    state: ElementsState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementsState {
    Start,
    Array,
    /// An element was not followed by `,` or `]`; one undecodable document
    /// is reported.
    Broken,
    Done,
}

impl JsonElements {
    fn open(path: &Path) -> Result<Self, Error> {
        let bytes = std::fs::read(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.to_path_buf(), bytes))
    }

    fn new(path: PathBuf, bytes: Vec<u8>) -> Self {
        Self {
            path,
            bytes,
            pos: 0,
            index: 0,
            state: ElementsState::Start,
        }
    }

    fn skip_whitespace(&mut self) {
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|byte| byte.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn origin(&self) -> String {
        format!("{}[{}]", self.path.display(), self.index)
    }

    fn next_element(&mut self) -> Document {
        let mut stream = serde_json::Deserializer::from_slice(&self.bytes[self.pos..])
            .into_iter::<serde_json::Value>();
        let document = match stream.next() {
            Some(Ok(value)) => {
                self.pos += stream.byte_offset();
                let origin = self.origin();
                Document::decode_value(value, || origin)
            }
            Some(Err(err)) => {
                self.state = ElementsState::Done;
                Document::Undecodable {
                    origin: self.origin(),
                    reason: err.to_string(),
                }
            }
            None => {
                self.state = ElementsState::Done;
                return Document::Undecodable {
                    origin: self.origin(),
                    reason: "unterminated array".to_owned(),
                };
            }
        };
        self.index += 1;

        if self.state == ElementsState::Array {
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {}
                _ => self.state = ElementsState::Broken,
            }
        }
        document
    }
}

impl Iterator for JsonElements {
    type Item = Result<Document, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            ElementsState::Done => None,
            ElementsState::Broken => {
                self.state = ElementsState::Done;
                Some(Ok(Document::Undecodable {
                    origin: self.origin(),
                    reason: "expected `,` or `]` after array element".to_owned(),
                }))
            }
            ElementsState::Start => {
                self.skip_whitespace();
                if self.peek() == Some(b'[') {
                    self.pos += 1;
                    self.state = ElementsState::Array;
                    self.next()
                } else {
                    self.state = ElementsState::Done;
                    let origin = self.path.display().to_string();
                    Some(Ok(Document::decode_slice(&self.bytes[self.pos..], || origin)))
                }
            }
            ElementsState::Array => {
                self.skip_whitespace();
                if self.peek() == Some(b']') {
                    self.state = ElementsState::Done;
                    return None;
                }
                Some(Ok(self.next_element()))
            }
        }
    }
}
