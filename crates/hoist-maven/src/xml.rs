//! Small indented XML writer shared by the POM and metadata renderers.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use hoist_util::errors::HoistError;

pub(crate) struct XmlWriter {
    writer: Writer<Vec<u8>>,
}

impl XmlWriter {
    pub(crate) fn new() -> miette::Result<Self> {
        let mut xml = Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        };
        xml.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(xml)
    }

    fn event(&mut self, event: Event<'_>) -> miette::Result<()> {
        self.writer.write_event(event).map_err(|e| {
            HoistError::Generic {
                message: format!("Failed to write XML: {e}"),
            }
            .into()
        })
    }

    pub(crate) fn open(&mut self, tag: &str) -> miette::Result<()> {
        self.event(Event::Start(BytesStart::new(tag)))
    }

    pub(crate) fn open_with(&mut self, tag: &str, attrs: &[(&str, &str)]) -> miette::Result<()> {
        let start = BytesStart::new(tag).with_attributes(attrs.iter().copied());
        self.event(Event::Start(start))
    }

    pub(crate) fn close(&mut self, tag: &str) -> miette::Result<()> {
        self.event(Event::End(BytesEnd::new(tag)))
    }

    /// `<tag>value</tag>`, with `value` escaped.
    pub(crate) fn leaf(&mut self, tag: &str, value: &str) -> miette::Result<()> {
        self.open(tag)?;
        self.event(Event::Text(BytesText::new(value)))?;
        self.close(tag)
    }

    /// Writes nothing when `value` is `None`.
    pub(crate) fn optional(&mut self, tag: &str, value: Option<&str>) -> miette::Result<()> {
        match value {
            Some(v) => self.leaf(tag, v),
            None => Ok(()),
        }
    }

    pub(crate) fn finish(self) -> String {
        let mut out = String::from_utf8_lossy(&self.writer.into_inner()).into_owned();
        out.push('\n');
        out
    }
}
