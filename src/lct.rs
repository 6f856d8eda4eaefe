//! `.lct` analysis files.
//!
//! ```xml
//! <lct version="1.0">
//!   <dimension>Semantics</dimension>
//!   <targets><target>SD</target><target>SG</target></targets>
//!   <analysis>
//!     <superClause value="24">
//!       <clause value="24">one two</clause>
//!     </superClause>
//!   </analysis>
//! </lct>
//! ```
//!
//! A `value` holds one digit per editable segment: the 1-based index of the
//! segment's value in the allowed list, or `0` for an untagged segment.

use crate::descriptor::DescriptorConfig;
use crate::error::LctError;
use crate::tree::{Clause, ClauseTree, SuperClause};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::path::Path;

/// Version written into new files.
pub const LCT_VERSION: &str = "1.0";

/// A tagged clause as stored in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LctClause {
    /// Digit-encoded descriptor
    pub value: String,
    /// Clause text
    pub text: String,
}

/// A super-clause as stored in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LctSuperClause {
    /// Digit-encoded descriptor of the super-clause
    pub value: String,
    /// Member clauses
    pub clauses: Vec<LctClause>,
}

/// In-memory form of an `.lct` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LctDocument {
    /// Format version
    pub version: String,
    /// Analyzed LCT dimension
    pub dimension: String,
    /// Labels of the editable segments
    pub targets: Vec<String>,
    /// Super-clauses in reading order
    pub analysis: Vec<LctSuperClause>,
}

fn xml_error(err: impl std::fmt::Display) -> LctError {
    LctError::Xml(err.to_string())
}

impl LctDocument {
    /// Encodes a clause tree with the digits of `config`.
    pub fn from_tree(tree: &ClauseTree, dimension: &str, config: &DescriptorConfig) -> Result<Self, LctError> {
        let analysis = tree
            .super_clauses
            .iter()
            .map(|super_clause| {
                let clauses = super_clause
                    .clauses
                    .iter()
                    .map(|clause| {
                        Ok(LctClause {
                            value: encode_tag(&clause.tag, config)?,
                            text: clause.text.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, LctError>>()?;
                Ok(LctSuperClause {
                    value: encode_tag(&super_clause.tag, config)?,
                    clauses,
                })
            })
            .collect::<Result<Vec<_>, LctError>>()?;
        Ok(Self {
            version: LCT_VERSION.to_string(),
            dimension: dimension.to_string(),
            targets: config.labels.clone(),
            analysis,
        })
    }

    /// Decodes the analysis into a clause tree.
    pub fn to_tree(&self, config: &DescriptorConfig) -> Result<ClauseTree, LctError> {
        let segments = config.template.segment_count();
        if !self.targets.is_empty() && self.targets.len() != segments {
            return Err(LctError::Structure(format!(
                "{} targets for {segments} editable segments",
                self.targets.len()
            )));
        }
        let super_clauses = self
            .analysis
            .iter()
            .map(|super_clause| {
                let clauses = super_clause
                    .clauses
                    .iter()
                    .map(|clause| {
                        Ok(Clause {
                            text: clause.text.clone(),
                            tag: decode_value(&clause.value, config)?,
                        })
                    })
                    .collect::<Result<Vec<_>, LctError>>()?;
                Ok(SuperClause {
                    clauses,
                    tag: decode_value(&super_clause.value, config)?,
                })
            })
            .collect::<Result<Vec<_>, LctError>>()?;
        Ok(ClauseTree { super_clauses })
    }

    /// Serializes the document as indented XML.
    pub fn to_xml(&self) -> Result<String, LctError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;
        writer
            .write_event(Event::Start(
                BytesStart::new("lct").with_attributes([("version", self.version.as_str())]),
            ))
            .map_err(xml_error)?;

        write_text_element(&mut writer, "dimension", &self.dimension)?;

        writer
            .write_event(Event::Start(BytesStart::new("targets")))
            .map_err(xml_error)?;
        for target in &self.targets {
            write_text_element(&mut writer, "target", target)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("targets")))
            .map_err(xml_error)?;

        writer
            .write_event(Event::Start(BytesStart::new("analysis")))
            .map_err(xml_error)?;
        for super_clause in &self.analysis {
            writer
                .write_event(Event::Start(
                    BytesStart::new("superClause").with_attributes([("value", super_clause.value.as_str())]),
                ))
                .map_err(xml_error)?;
            for clause in &super_clause.clauses {
                writer
                    .write_event(Event::Start(
                        BytesStart::new("clause").with_attributes([("value", clause.value.as_str())]),
                    ))
                    .map_err(xml_error)?;
                writer
                    .write_event(Event::Text(BytesText::new(&clause.text)))
                    .map_err(xml_error)?;
                writer
                    .write_event(Event::End(BytesEnd::new("clause")))
                    .map_err(xml_error)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("superClause")))
                .map_err(xml_error)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("analysis")))
            .map_err(xml_error)?;
        writer
            .write_event(Event::End(BytesEnd::new("lct")))
            .map_err(xml_error)?;

        String::from_utf8(writer.into_inner()).map_err(xml_error)
    }

    /// Parses an `.lct` document.
    pub fn from_xml(xml: &str) -> Result<Self, LctError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut doc = Self {
            version: String::new(),
            dimension: String::new(),
            targets: Vec::new(),
            analysis: Vec::new(),
        };
        let mut path: Vec<String> = Vec::new();
        let mut saw_root = false;

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(e) => {
                    let name = doc.open_element(path.last().map(String::as_str), &e)?;
                    saw_root |= name == "lct";
                    path.push(name);
                }
                Event::Empty(e) => {
                    let name = doc.open_element(path.last().map(String::as_str), &e)?;
                    saw_root |= name == "lct";
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(xml_error)?.into_owned();
                    doc.set_text(path.last().map(String::as_str), text)?;
                }
                Event::End(_) => {
                    path.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_root {
            return Err(LctError::Structure("missing <lct> root element".to_string()));
        }
        Ok(doc)
    }

    /// Reads and parses a file.
    pub fn read(path: &Path) -> Result<Self, LctError> {
        let xml = std::fs::read_to_string(path)?;
        Self::from_xml(&xml)
    }

    /// Serializes and writes a file.
    pub fn write(&self, path: &Path) -> Result<(), LctError> {
        std::fs::write(path, self.to_xml()?)?;
        Ok(())
    }

    /// Registers an opening tag and returns its name.
    fn open_element(&mut self, parent: Option<&str>, e: &BytesStart) -> Result<String, LctError> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        match (parent, name.as_str()) {
            (None, "lct") => {
                self.version = attribute(e, "version")?.unwrap_or_else(|| LCT_VERSION.to_string());
            }
            (Some("lct"), "dimension" | "targets" | "analysis") => {}
            (Some("targets"), "target") => self.targets.push(String::new()),
            (Some("analysis"), "superClause") => self.analysis.push(LctSuperClause {
                value: required_attribute(e, "value")?,
                clauses: Vec::new(),
            }),
            (Some("superClause"), "clause") => {
                let value = required_attribute(e, "value")?;
                let super_clause = self
                    .analysis
                    .last_mut()
                    .ok_or_else(|| LctError::Structure("clause outside superClause".to_string()))?;
                super_clause.clauses.push(LctClause {
                    value,
                    text: String::new(),
                });
            }
            (parent, other) => {
                return Err(LctError::Structure(format!(
                    "unexpected <{other}> inside {}",
                    parent.map_or_else(|| "the document".to_string(), |p| format!("<{p}>"))
                )))
            }
        }
        Ok(name)
    }

    fn set_text(&mut self, element: Option<&str>, text: String) -> Result<(), LctError> {
        let slot = match element {
            Some("dimension") => Some(&mut self.dimension),
            Some("target") => self.targets.last_mut(),
            Some("clause") => self
                .analysis
                .last_mut()
                .and_then(|s| s.clauses.last_mut())
                .map(|c| &mut c.text),
            _ => None,
        };
        match slot {
            Some(slot) => {
                *slot = text;
                Ok(())
            }
            None => Err(LctError::Structure(format!("unexpected text {text:?}"))),
        }
    }
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), LctError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)?;
    Ok(())
}

fn attribute(e: &BytesStart, name: &str) -> Result<Option<String>, LctError> {
    match e.try_get_attribute(name).map_err(xml_error)? {
        Some(attr) => Ok(Some(attr.unescape_value().map_err(xml_error)?.into_owned())),
        None => Ok(None),
    }
}

fn required_attribute(e: &BytesStart, name: &str) -> Result<String, LctError> {
    attribute(e, name)?.ok_or_else(|| {
        LctError::Structure(format!(
            "<{}> is missing the {name:?} attribute",
            String::from_utf8_lossy(e.name().as_ref())
        ))
    })
}

/// `"SD+;SG--"` → `"24"` for values `["++", "+", "-", "--"]`.
fn encode_tag(tag: &str, config: &DescriptorConfig) -> Result<String, LctError> {
    if config.allowed_values.len() > 9 {
        return Err(LctError::Digit(tag.to_string()));
    }
    let values = if tag.is_empty() {
        config.template.untagged()
    } else {
        config
            .template
            .parse_tag(tag, &config.allowed_values)
            .ok_or_else(|| LctError::Digit(tag.to_string()))?
    };
    Ok(values
        .iter()
        .map(|value| {
            let digit = config
                .allowed_values
                .iter()
                .position(|v| v == value)
                .map_or(0, |i| i + 1);
            char::from(b'0' + digit as u8)
        })
        .collect())
}

/// `"24"` → `"SD+;SG--"` for values `["++", "+", "-", "--"]`.
fn decode_value(value: &str, config: &DescriptorConfig) -> Result<String, LctError> {
    let digits: Vec<u32> = value
        .chars()
        .map(|c| c.to_digit(10))
        .collect::<Option<_>>()
        .ok_or_else(|| LctError::Digit(value.to_string()))?;
    if digits.len() != config.template.segment_count() {
        return Err(LctError::Digit(value.to_string()));
    }
    let values = digits
        .into_iter()
        .map(|digit| match digit {
            0 => Ok(config.template.placeholder.to_string()),
            d => config
                .allowed_values
                .get(d as usize - 1)
                .cloned()
                .ok_or_else(|| LctError::Digit(value.to_string())),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(config.template.render(&values))
}
