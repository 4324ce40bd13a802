//! XML wire format of an [`Aggregation`].
//!
//! ```text
//! <aggregation>
//!   <interval name="07.2024">
//!     <group name="default">
//!       <resultInteger>42</resultInteger>
//!     </group>
//!     <group name="CODE_A">
//!       <resultMap>
//!         <identifier>ERROR</identifier><value>3</value>
//!       </resultMap>
//!     </group>
//!   </interval>
//! </aggregation>
//! ```
//!
//! Dates travel as epoch milliseconds.

use super::{Aggregation, AggregationIntervalResult, FrequencyTable, ResultValue};
use crate::error::{AggregationError, Result};
use chrono::DateTime;
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

const AGGREGATION: &str = "aggregation";
const INTERVAL: &str = "interval";
const GROUP: &str = "group";
const NAME: &str = "name";
const RESULT_INTEGER: &str = "resultInteger";
const RESULT_LONG: &str = "resultLong";
const RESULT_DOUBLE: &str = "resultDouble";
const RESULT_FLOAT: &str = "resultFloat";
const RESULT_DATE: &str = "resultDate";
const RESULT_MAP: &str = "resultMap";
const IDENTIFIER: &str = "identifier";
const VALUE: &str = "value";

/// Serialize to UTF-8 XML with declaration. `indent` of 0 writes a compact
/// single-line document.
pub fn to_xml(aggregation: &Aggregation, indent: usize) -> Result<String> {
    let mut writer = if indent > 0 {
        Writer::new_with_indent(Vec::new(), b' ', indent)
    } else {
        Writer::new(Vec::new())
    };

    let decl = BytesDecl::new("1.0", Some("UTF-8"), None);
    write(&mut writer, Event::Decl(decl))?;
    write(&mut writer, Event::Start(BytesStart::new(AGGREGATION)))?;
    for (interval, groups) in aggregation.entries() {
        write(
            &mut writer,
            Event::Start(BytesStart::new(INTERVAL).with_attributes([(NAME, interval.as_str())])),
        )?;
        for (group, value) in groups {
            write(
                &mut writer,
                Event::Start(BytesStart::new(GROUP).with_attributes([(NAME, group.as_str())])),
            )?;
            write_value(&mut writer, value)?;
            write(&mut writer, Event::End(BytesEnd::new(GROUP)))?;
        }
        write(&mut writer, Event::End(BytesEnd::new(INTERVAL)))?;
    }
    write(&mut writer, Event::End(BytesEnd::new(AGGREGATION)))?;

    String::from_utf8(writer.into_inner()).map_err(AggregationError::xml)
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer.write_event(event).map_err(AggregationError::xml)
}

fn write_leaf(writer: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> Result<()> {
    write(writer, Event::Start(BytesStart::new(tag)))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(tag)))
}

fn write_value(writer: &mut Writer<Vec<u8>>, value: &ResultValue) -> Result<()> {
    match value {
        ResultValue::Integer(v) => write_leaf(writer, RESULT_INTEGER, &v.to_string()),
        ResultValue::Long(v) => write_leaf(writer, RESULT_LONG, &v.to_string()),
        ResultValue::Double(v) => write_leaf(writer, RESULT_DOUBLE, &v.to_string()),
        ResultValue::Float(v) => write_leaf(writer, RESULT_FLOAT, &v.to_string()),
        ResultValue::Date(v) => write_leaf(writer, RESULT_DATE, &v.timestamp_millis().to_string()),
        ResultValue::Frequencies(table) => {
            write(writer, Event::Start(BytesStart::new(RESULT_MAP)))?;
            for (identifier, count) in table {
                write_leaf(writer, IDENTIFIER, identifier)?;
                write_leaf(writer, VALUE, &count.to_string())?;
            }
            write(writer, Event::End(BytesEnd::new(RESULT_MAP)))
        }
    }
}

/// Parse the wire format back into an [`Aggregation`].
pub fn from_xml(xml: &str) -> Result<Aggregation> {
    let mut reader = Reader::from_str(xml);
    let mut parser = Parser::default();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(AggregationError::Xml(format!(
                    "malformed document at byte {}: {}",
                    reader.buffer_position(), e
                )));
            }
        };
        match event {
            Event::Start(ref e) => parser.open(e)?,
            Event::Empty(ref e) => {
                parser.open(e)?;
                parser.close()?;
            }
            Event::End(_) => parser.close()?,
            Event::Text(ref t) => parser.text(&t.unescape().map_err(AggregationError::xml)?)?,
            Event::CData(ref c) => parser.text(&String::from_utf8_lossy(c))?,
            Event::Eof => break,
            _ => {}
        }
    }

    parser.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    Integer,
    Long,
    Double,
    Float,
    Date,
}

impl Scalar {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"resultInteger" => Some(Scalar::Integer),
            b"resultLong" => Some(Scalar::Long),
            b"resultDouble" => Some(Scalar::Double),
            b"resultFloat" => Some(Scalar::Float),
            b"resultDate" => Some(Scalar::Date),
            _ => None,
        }
    }

    fn parse(self, text: &str) -> Result<ResultValue> {
        let raw = text.trim();
        let bad = || AggregationError::Xml(format!("invalid {:?} value '{}'", self, raw));
        Ok(match self {
            Scalar::Integer => ResultValue::Integer(raw.parse().map_err(|_| bad())?),
            Scalar::Long => ResultValue::Long(raw.parse().map_err(|_| bad())?),
            Scalar::Double => ResultValue::Double(raw.parse().map_err(|_| bad())?),
            Scalar::Float => ResultValue::Float(raw.parse().map_err(|_| bad())?),
            Scalar::Date => {
                let millis: i64 = raw.parse().map_err(|_| bad())?;
                ResultValue::Date(DateTime::from_timestamp_millis(millis).ok_or_else(bad)?)
            }
        })
    }
}

/// Open element, innermost last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Root,
    Interval,
    Group,
    Scalar(Scalar),
    Map,
    Identifier,
    Value,
}

impl Frame {
    fn is_leaf(&self) -> bool {
        matches!(self, Frame::Scalar(_) | Frame::Identifier | Frame::Value)
    }
}

#[derive(Debug, Default)]
struct Parser {
    stack: Vec<Frame>,
    seen_root: bool,
    aggregation: Aggregation,
    interval: Option<(String, IndexMap<String, ResultValue>)>,
    group: Option<(String, Option<ResultValue>)>,
    table: FrequencyTable,
    identifier: Option<String>,
    text: String,
}

impl Parser {
    fn open(&mut self, e: &BytesStart<'_>) -> Result<()> {
        let tag = e.name();
        let tag = tag.as_ref();
        let frame = match (self.stack.last(), tag) {
            (None, b"aggregation") if !self.seen_root => {
                self.seen_root = true;
                Frame::Root
            }
            (Some(Frame::Root), b"interval") => {
                self.interval = Some((name_attr(e)?, IndexMap::new()));
                Frame::Interval
            }
            (Some(Frame::Interval), b"group") => {
                self.group = Some((name_attr(e)?, None));
                Frame::Group
            }
            (Some(Frame::Group), _) => {
                if matches!(self.group, Some((_, Some(_)))) {
                    return Err(unexpected(tag, "a group holds exactly one value"));
                }
                if tag == RESULT_MAP.as_bytes() {
                    self.table = FrequencyTable::new();
                    self.identifier = None;
                    Frame::Map
                } else {
                    let scalar = Scalar::from_tag(tag)
                        .ok_or_else(|| unexpected(tag, "unknown result element"))?;
                    self.text.clear();
                    Frame::Scalar(scalar)
                }
            }
            (Some(Frame::Map), b"identifier") => {
                if self.identifier.is_some() {
                    return Err(unexpected(tag, "identifier without value"));
                }
                self.text.clear();
                Frame::Identifier
            }
            (Some(Frame::Map), b"value") => {
                if self.identifier.is_none() {
                    return Err(unexpected(tag, "value without identifier"));
                }
                self.text.clear();
                Frame::Value
            }
            _ => return Err(unexpected(tag, "unknown element")),
        };
        self.stack.push(frame);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| AggregationError::xml("closing tag without opening tag"))?;

        match frame {
            Frame::Root => {}
            Frame::Interval => {
                if let Some((name, groups)) = self.interval.take() {
                    self.aggregation
                        .add(AggregationIntervalResult::new(name, groups));
                }
            }
            Frame::Group => {
                let (name, value) = self
                    .group
                    .take()
                    .ok_or_else(|| AggregationError::xml("group state lost"))?;
                let value = value.ok_or_else(|| {
                    AggregationError::Xml(format!("group '{}' has no result value", name))
                })?;
                if let Some((_, groups)) = self.interval.as_mut() {
                    groups.insert(name, value);
                }
            }
            Frame::Scalar(scalar) => {
                let value = scalar.parse(&self.text)?;
                self.set_group_value(value);
            }
            Frame::Map => {
                if let Some(identifier) = self.identifier.take() {
                    return Err(AggregationError::Xml(format!(
                        "identifier '{}' has no value",
                        identifier
                    )));
                }
                let table = std::mem::take(&mut self.table);
                self.set_group_value(ResultValue::Frequencies(table));
            }
            Frame::Identifier => {
                self.identifier = Some(std::mem::take(&mut self.text));
            }
            Frame::Value => {
                let raw = self.text.trim();
                let count: u64 = raw.parse().map_err(|_| {
                    AggregationError::Xml(format!("invalid frequency count '{}'", raw))
                })?;
                if let Some(identifier) = self.identifier.take() {
                    self.table.insert(identifier, count);
                }
            }
        }
        Ok(())
    }

    fn set_group_value(&mut self, value: ResultValue) {
        if let Some((_, slot)) = self.group.as_mut() {
            *slot = Some(value);
        }
    }

    fn text(&mut self, text: &str) -> Result<()> {
        match self.stack.last() {
            Some(frame) if frame.is_leaf() => {
                self.text.push_str(text);
                Ok(())
            }
            _ if text.trim().is_empty() => Ok(()),
            _ => Err(AggregationError::Xml(format!("unexpected text '{}'", text.trim()))),
        }
    }

    fn finish(self) -> Result<Aggregation> {
        if !self.seen_root {
            return Err(AggregationError::xml("missing <aggregation> element"));
        }
        if !self.stack.is_empty() {
            return Err(AggregationError::xml("unexpected end of document"));
        }
        Ok(self.aggregation)
    }
}

fn name_attr(e: &BytesStart<'_>) -> Result<String> {
    let attr = e
        .try_get_attribute(NAME)
        .map_err(AggregationError::xml)?
        .ok_or_else(|| {
            AggregationError::Xml(format!(
                "<{}> without name attribute",
                String::from_utf8_lossy(e.name().as_ref())
            ))
        })?;
    let value = attr.unescape_value().map_err(AggregationError::xml)?;
    Ok(value.into_owned())
}

fn unexpected(tag: &[u8], reason: &str) -> AggregationError {
    AggregationError::Xml(format!("unexpected <{}>: {}", String::from_utf8_lossy(tag), reason))
}
