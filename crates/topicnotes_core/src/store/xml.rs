//! XML encoding for the persisted document.

use super::{StoreError, StoreResult};
use crate::model::document::Document;
use quick_xml::se::Serializer;
use serde::Serialize;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;
const INDENT_WIDTH: usize = 2;

/// Renders the whole document as indented XML.
pub fn encode(document: &Document) -> StoreResult<String> {
    let mut body = String::new();
    let mut serializer = Serializer::new(&mut body);
    serializer.indent(' ', INDENT_WIDTH);
    document
        .serialize(serializer)
        .map_err(|err| StoreError::Encode(err.to_string()))?;
    Ok(format!("{XML_DECLARATION}\n{body}\n"))
}

/// Parses a document; any structural problem is a `StoreError::Decode`.
pub fn decode(source: &str) -> StoreResult<Document> {
    if source.trim().is_empty() {
        return Err(StoreError::Decode("document is empty".to_string()));
    }
    quick_xml::de::from_str(source).map_err(|err| StoreError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{decode, encode};
    use crate::model::document::{Document, Note};

    fn sample() -> Document {
        let mut document = Document::new();
        let (index, _) = document.upsert_topic("Rust & <XML>");
        let topic = document.topic_mut(index).unwrap();
        topic.append_note(Note::new("first", "a \"quoted\" body", "01/02/2024 03:04:05"));
        topic.append_note(Note::new("first", "same name again", "02/02/2024 03:04:05"));
        document.upsert_topic("empty topic");
        document
    }

    #[test]
    fn encoded_document_uses_topic_and_note_elements() {
        let xml = encode(&sample()).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<data>"));
        assert!(xml.contains(r#"<topic name="Rust &amp; &lt;XML&gt;">"#));
        assert!(xml.contains(r#"<note name="first">"#));
        assert!(xml.contains("<timestamp>01/02/2024 03:04:05</timestamp>"));
    }

    #[test]
    fn decode_reads_back_what_encode_wrote() {
        let document = sample();
        let decoded = decode(&encode(&document).unwrap()).unwrap();
        assert_eq!(decoded, document);
    }

    #[test]
    fn decode_accepts_unindented_legacy_layout() {
        let legacy = "<data>\n<topic name=\"t\">\n<note name=\"n\">\n<text>body</text>\n<timestamp>01/01/2024 00:00:00</timestamp>\n</note>\n</topic>\n</data>\n";
        let document = decode(legacy).unwrap();
        let topic = document.find_topic("t").unwrap();
        assert_eq!(topic.notes().len(), 1);
        assert_eq!(topic.notes()[0].text, "body");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode("").is_err());
        assert!(decode("<data><topic name=\"x\">").is_err());
        assert!(decode("not xml at all").is_err());
    }
}
