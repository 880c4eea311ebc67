//! XML-to-tree parsing over the `quick-xml` event reader.
//!
//! The output shape follows the usual lenient element-to-mapping
//! convention: an element becomes a mapping of its children, repeated
//! sibling elements of one name collapse into a sequence, attributes land
//! under `"@attributes"`, a text-only element becomes a plain string, and
//! text next to attributes or children is kept under `"#text"`.

use crate::error::FormatError;
use crate::value::Value;
use miette::NamedSource;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;

/// Checks whether a string is well-formed XML with a single root element.
#[must_use]
pub fn is_valid(input: &str) -> bool {
    parse(input).is_ok()
}

/// Parses an XML document into a [`Value`] tree. The root element's name
/// is dropped; its content is the result.
///
/// # Errors
///
/// Returns `xml::invalid` with a span at the reader position where
/// parsing stopped.
pub fn parse(input: &str) -> Result<Value, FormatError> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        let position = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| invalid(input, position, e))?;

        match event {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(invalid(input, position, "more than one root element"));
                }
                let mut frame = Frame::new();
                frame.read_attributes(&start, input, position)?;
                stack.push(frame);
            }
            Event::Empty(start) => {
                let mut frame = Frame::new();
                frame.read_attributes(&start, input, position)?;
                let name = name_of(&start);
                let value = frame.into_value();
                attach(&mut stack, &mut root, &name, value, input, position)?;
            }
            Event::Text(text) => {
                let text = text.xml_content().map_err(|e| invalid(input, position, e))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                } else if !text.trim().is_empty() {
                    return Err(invalid(input, position, "text outside the root element"));
                }
            }
            Event::CData(cdata) => {
                let text = String::from_utf8_lossy(&cdata).into_owned();
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::End(end) => {
                // The reader has already verified tag nesting.
                let frame = match stack.pop() {
                    Some(frame) => frame,
                    None => return Err(invalid(input, position, "unexpected closing tag")),
                };
                let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                let value = frame.into_value();
                attach(&mut stack, &mut root, &name, value, input, position)?;
            }
            Event::Eof => {
                if !stack.is_empty() {
                    return Err(invalid(input, position, "unexpected end of document"));
                }
                break;
            }
            // Declarations, comments, processing instructions.
            _ => {}
        }
    }

    match root {
        Some(value) => Ok(value),
        None => Err(invalid(input, 0, "document has no root element")),
    }
}

/// An element being assembled: its attributes and children so far, plus
/// any accumulated character data.
struct Frame {
    children: BTreeMap<String, Value>,
    attributes: BTreeMap<String, Value>,
    text: String,
}

impl Frame {
    fn new() -> Self {
        Frame {
            children: BTreeMap::new(),
            attributes: BTreeMap::new(),
            text: String::new(),
        }
    }

    fn read_attributes(
        &mut self,
        start: &quick_xml::events::BytesStart<'_>,
        input: &str,
        position: usize,
    ) -> Result<(), FormatError> {
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| invalid(input, position, e))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| invalid(input, position, e))?
                .into_owned();
            self.attributes.insert(key, Value::String(value));
        }
        Ok(())
    }

    fn into_value(self) -> Value {
        let text = self.text.trim();
        if self.children.is_empty() && self.attributes.is_empty() {
            return if text.is_empty() {
                Value::Object(BTreeMap::new())
            } else {
                Value::String(text.to_string())
            };
        }

        let mut map = self.children;
        if !self.attributes.is_empty() {
            map.insert("@attributes".to_string(), Value::Object(self.attributes));
        }
        if !text.is_empty() {
            map.insert("#text".to_string(), Value::String(text.to_string()));
        }
        Value::Object(map)
    }
}

/// Hangs a finished element onto its parent frame, collapsing repeated
/// sibling names into a sequence; a finished root element becomes the
/// result.
fn attach(
    stack: &mut [Frame],
    root: &mut Option<Value>,
    name: &str,
    value: Value,
    input: &str,
    position: usize,
) -> Result<(), FormatError> {
    match stack.last_mut() {
        Some(parent) => {
            match parent.children.remove(name) {
                Some(Value::Array(mut items)) => {
                    items.push(value);
                    parent.children.insert(name.to_string(), Value::Array(items));
                }
                Some(existing) => {
                    parent
                        .children
                        .insert(name.to_string(), Value::Array(vec![existing, value]));
                }
                None => {
                    parent.children.insert(name.to_string(), value);
                }
            }
            Ok(())
        }
        None => {
            if root.is_some() {
                return Err(invalid(input, position, "more than one root element"));
            }
            *root = Some(value);
            Ok(())
        }
    }
}

fn name_of(start: &quick_xml::events::BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn invalid(input: &str, position: usize, message: impl std::fmt::Display) -> FormatError {
    let position = position.min(input.len());
    FormatError::InvalidXml {
        message: message.to_string(),
        src: NamedSource::new("document.xml", input.to_string()),
        span: (position, 0).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_document() {
        let xml = r#"<config>
            <name>My App</name>
            <server><host>a.example.com</host></server>
        </config>"#;
        let tree = parse(xml).unwrap();
        let expected = crate::json::parse(
            r#"{ "name": "My App", "server": { "host": "a.example.com" } }"#,
        )
        .unwrap();
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_repeated_siblings_collapse_to_sequence() {
        let xml = "<list><item>a</item><item>b</item><item>c</item></list>";
        let tree = parse(xml).unwrap();
        let expected = crate::json::parse(r#"{ "item": ["a", "b", "c"] }"#).unwrap();
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_attributes_and_mixed_text() {
        let xml = r#"<entry id="7" kind="note">hello</entry>"#;
        let tree = parse(xml).unwrap();
        let expected = crate::json::parse(
            r##"{ "@attributes": { "id": "7", "kind": "note" }, "#text": "hello" }"##,
        )
        .unwrap();
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_empty_element_is_empty_mapping() {
        let tree = parse("<root><nothing/></root>").unwrap();
        let expected = crate::json::parse(r#"{ "nothing": {} }"#).unwrap();
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_invalid_is_error_and_is_valid_agrees() {
        assert!(!is_valid("<a><b></a></b>"));
        assert!(!is_valid("no xml here"));
        assert!(is_valid("<a>x</a>"));
        assert!(matches!(
            parse("<a><b></a>"),
            Err(FormatError::InvalidXml { .. })
        ));
    }
}
