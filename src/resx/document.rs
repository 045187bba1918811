use crate::resx::{types::ResourceEntry, ResxError, Result};
use log::debug;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Where new `data` nodes go when the document is serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
enum InsertPoint {
    /// Byte offset of the root element's closing tag
    BeforeEndTag(usize),
    /// A `<root/>` element, expanded into an open/close pair on first insert
    SelfClosing { span: Range<usize>, root_name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Value,
    Comment,
}

struct OpenData {
    entry: ResourceEntry,
    depth: usize,
}

/// A resource file held as its original text plus the entries appended to it.
///
/// Serializing splices the appended nodes in front of the root's closing tag,
/// so bytes that were already in the file are written back untouched.
pub struct ResxDocument {
    path: PathBuf,
    source: String,
    entries: Vec<ResourceEntry>,
    insert_point: InsertPoint,
    appended: Vec<ResourceEntry>,
}

impl ResxDocument {
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading resource file: {}", path.display());
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(ResxError::NotFound(path.to_path_buf()))
            }
            Err(err) => return Err(err.into()),
        };
        Self::parse(path, source)
    }

    pub fn parse(path: &Path, source: String) -> Result<Self> {
        let (entries, insert_point) = scan(&source).map_err(|message| ResxError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        debug!("Parsed {} entries from {}", entries.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            source,
            entries,
            insert_point,
            appended: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in document order, followed by any appended ones
    pub fn entries(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.entries.iter().chain(self.appended.iter())
    }

    /// Key to text mapping; on duplicate keys the first occurrence wins.
    pub fn texts(&self) -> HashMap<String, String> {
        let mut texts = HashMap::new();
        for entry in self.entries() {
            texts
                .entry(entry.name.clone())
                .or_insert_with(|| entry.text.clone());
        }
        texts
    }

    pub fn append(&mut self, entry: ResourceEntry) {
        debug!("Appending '{}' to {}", entry.name, self.path.display());
        self.appended.push(entry);
    }

    pub fn is_modified(&self) -> bool {
        !self.appended.is_empty()
    }

    pub fn to_xml(&self) -> String {
        if self.appended.is_empty() {
            return self.source.clone();
        }

        let newline = if self.source.contains("\r\n") { "\r\n" } else { "\n" };
        let nodes: String = self
            .appended
            .iter()
            .map(|entry| render_entry(entry, newline))
            .collect();

        match &self.insert_point {
            InsertPoint::BeforeEndTag(offset) => {
                let (head, tail) = self.source.split_at(*offset);
                let line_start = head.rfind('\n').map_or(0, |i| i + 1);
                if head[line_start..].trim().is_empty() {
                    // Closing tag on its own line: insert whole lines above it
                    format!(
                        "{}{}{}",
                        &self.source[..line_start],
                        nodes,
                        &self.source[line_start..]
                    )
                } else {
                    format!("{}{}{}{}", head, newline, nodes, tail)
                }
            }
            InsertPoint::SelfClosing { span, root_name } => {
                let open = self.source[span.clone()].trim_end_matches("/>").trim_end();
                format!(
                    "{}{}>{}{}</{}>{}",
                    &self.source[..span.start],
                    open,
                    newline,
                    nodes,
                    root_name,
                    &self.source[span.end..]
                )
            }
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        debug!("Saving resource file: {}", self.path.display());
        fs::write(&self.path, self.to_xml())
    }
}

fn render_entry(entry: &ResourceEntry, newline: &str) -> String {
    format!(
        "  <data name=\"{name}\" xml:space=\"preserve\">{nl}    <value>{value}</value>{nl}    <comment>{comment}</comment>{nl}  </data>{nl}",
        name = escape(entry.name.as_str()),
        value = escape(entry.text.as_str()),
        comment = escape(entry.description.as_str()),
        nl = newline,
    )
}

fn data_name(element: &BytesStart<'_>) -> std::result::Result<String, String> {
    let attribute = element
        .try_get_attribute("name")
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "data element without a name attribute".to_string())?;
    let value = attribute.unescape_value().map_err(|e| e.to_string())?;
    Ok(value.into_owned())
}

fn push_field(entry: &mut ResourceEntry, field: Field, text: &str) {
    match field {
        Field::Value => entry.text.push_str(text),
        Field::Comment => entry.description.push_str(text),
    }
}

// RUST LEARNING: Event-based XML reading (like a SAX parser)
// - `read_event()` yields one tag/text chunk at a time, borrowing from `source`
// - `buffer_position()` is the byte offset reached so far, which lets us
//   find where the root's closing tag sits without re-serializing anything
fn scan(source: &str) -> std::result::Result<(Vec<ResourceEntry>, InsertPoint), String> {
    let mut reader = Reader::from_str(source);
    let mut depth = 0usize;
    let mut entries = Vec::new();
    let mut insert_point = None;
    let mut current: Option<OpenData> = None;
    let mut field: Option<Field> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("at byte {}: {}", reader.buffer_position(), e))?;
        // Position just past the markup of the event we were handed
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                if depth == 0 && insert_point.is_some() {
                    return Err("document has more than one root element".to_string());
                }
                depth += 1;
                let name = e.name();
                match name.as_ref() {
                    b"data" if depth > 1 && current.is_none() => {
                        current = Some(OpenData {
                            entry: ResourceEntry::new(data_name(&e)?, "", ""),
                            depth,
                        });
                    }
                    b"value" | b"comment" => {
                        if current.as_ref().is_some_and(|data| depth == data.depth + 1) {
                            field = Some(if name.as_ref() == b"value" {
                                Field::Value
                            } else {
                                Field::Comment
                            });
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if depth == 0 {
                    if insert_point.is_some() {
                        return Err("document has more than one root element".to_string());
                    }
                    let start = source[..end].rfind('<').unwrap_or(0);
                    insert_point = Some(InsertPoint::SelfClosing {
                        span: start..end,
                        root_name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    });
                } else if e.name().as_ref() == b"data" && current.is_none() {
                    entries.push(ResourceEntry::new(data_name(&e)?, "", ""));
                }
            }
            Event::Text(t) => {
                if let (Some(data), Some(field)) = (current.as_mut(), field) {
                    let text = t.unescape().map_err(|e| e.to_string())?;
                    push_field(&mut data.entry, field, &text);
                }
            }
            Event::CData(c) => {
                if let (Some(data), Some(field)) = (current.as_mut(), field) {
                    let raw = c.into_inner();
                    push_field(&mut data.entry, field, &String::from_utf8_lossy(&raw));
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return Err(format!("at byte {}: unexpected closing tag", end));
                }
                if field.is_some() && current.as_ref().is_some_and(|data| depth == data.depth + 1) {
                    field = None;
                }
                if current.as_ref().is_some_and(|data| data.depth == depth) {
                    if let Some(data) = current.take() {
                        entries.push(data.entry);
                    }
                }
                if depth == 1 {
                    let start = source[..end].rfind("</").unwrap_or(end);
                    insert_point = Some(InsertPoint::BeforeEndTag(start));
                }
                depth -= 1;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err("unexpected end of document: unclosed elements".to_string());
    }

    insert_point
        .map(|point| (entries, point))
        .ok_or_else(|| "document has no root element".to_string())
}
