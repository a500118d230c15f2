use std::collections::HashMap;

use uuid::Uuid;

use crate::error::Error;
use crate::image::{ImageSource, ResolvedImage};
use crate::table::Table;
use crate::template;

/// Payload of a leaf MIME part.
#[derive(Clone, Debug)]
pub enum PartBody {
    Text(String),
    Binary(Vec<u8>),
}

/// One MIME part: a leaf (text or binary payload) or a multipart
/// container with ordered children.
#[derive(Clone, Debug)]
pub struct Part {
    content_type: String,
    headers: Vec<(String, String)>,
    body: PartBody,
    children: Vec<Part>,
}

impl Part {
    fn text(content_type: &str, body: String) -> Part {
        Part {
            content_type: content_type.to_string(),
            headers: Vec::new(),
            body: PartBody::Text(body),
            children: Vec::new(),
        }
    }

    fn inline_image(subtype: &str, content_id: &str, data: Vec<u8>) -> Part {
        Part {
            content_type: format!("image/{}", subtype),
            headers: vec![
                ("Content-ID".to_string(), format!("<{}>", content_id)),
                ("Content-Disposition".to_string(), "inline".to_string()),
            ],
            body: PartBody::Binary(data),
            children: Vec::new(),
        }
    }

    fn container(content_type: &str, children: Vec<Part>) -> Part {
        Part {
            content_type: content_type.to_string(),
            headers: Vec::new(),
            body: PartBody::Text(String::new()),
            children,
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Content identifier of an inline part, without the angle brackets.
    pub fn content_id(&self) -> Option<&str> {
        self.header("Content-ID")
            .map(|v| v.trim_start_matches('<').trim_end_matches('>'))
    }

    pub fn children(&self) -> &[Part] {
        &self.children
    }

    pub fn body(&self) -> &PartBody {
        &self.body
    }

    /// Encoded text of a text part.
    pub fn text_payload(&self) -> Option<&str> {
        match self.body {
            PartBody::Text(ref text) => Some(text.as_str()),
            PartBody::Binary(_) => None,
        }
    }

    /// Raw bytes of a binary part.
    pub fn binary_payload(&self) -> Option<&[u8]> {
        match self.body {
            PartBody::Binary(ref data) => Some(data.as_slice()),
            PartBody::Text(_) => None,
        }
    }
}

/// A fully assembled message, ready for a mail transfer client.
///
/// Exposes exactly the From/To/Subject/Content-Type headers plus the
/// ordered part tree. Once returned by the builder the caller owns every
/// part; the builder keeps nothing.
#[derive(Clone, Debug)]
pub struct Message {
    sender: String,
    recipients: Vec<String>,
    subject: String,
    content_type: String,
    parts: Vec<Part>,
}

impl Message {
    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Top-level content type: `multipart/alternative` when the message
    /// carries an inline image or a plain-text alternative, otherwise the
    /// single part's own type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The produced header fields. Nothing beyond these four.
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("From".to_string(), self.sender.clone()),
            ("To".to_string(), self.recipients.join(", ")),
            ("Subject".to_string(), self.subject.clone()),
            ("Content-Type".to_string(), self.content_type.clone()),
        ]
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Serialize to RFC 5322 text for an SMTP client.
    pub fn to_wire(&self) -> String {
        crate::mime::to_wire(self)
    }
}

/// Builds a [`Message`] out of body templates plus named image and table
/// substitution maps.
///
/// A single `build` call runs the whole pipeline: validate input, resolve
/// every image source, substitute placeholders, assemble the part tree.
/// There is no intermediate state to observe and nothing is retried.
pub struct MessageBuilder {
    sender: String,
    recipients: Vec<String>,
    subject: String,
    html_body: Option<String>,
    text_body: Option<String>,
    images: Vec<(String, ImageSource)>,
    tables: Vec<(String, Table)>,
}

impl MessageBuilder {
    pub fn new() -> MessageBuilder {
        MessageBuilder {
            sender: String::new(),
            recipients: Vec::new(),
            subject: String::new(),
            html_body: None,
            text_body: None,
            images: Vec::new(),
            tables: Vec::new(),
        }
    }

    pub fn sender<S: Into<String>>(mut self, sender: S) -> Self {
        self.sender = sender.into();
        self
    }

    pub fn recipient<S: Into<String>>(mut self, recipient: S) -> Self {
        self.recipients.push(recipient.into());
        self
    }

    pub fn recipients<S: Into<String>>(mut self, recipients: Vec<S>) -> Self {
        self.recipients
            .extend(recipients.into_iter().map(|r| r.into()));
        self
    }

    pub fn subject<S: Into<String>>(mut self, subject: S) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn html_body<S: Into<String>>(mut self, body: S) -> Self {
        self.html_body = Some(body.into());
        self
    }

    pub fn text_body<S: Into<String>>(mut self, body: S) -> Self {
        self.text_body = Some(body.into());
        self
    }

    pub fn image<S: Into<String>, I: Into<ImageSource>>(mut self, name: S, source: I) -> Self {
        self.images.push((name.into(), source.into()));
        self
    }

    pub fn table<S: Into<String>>(mut self, name: S, table: Table) -> Self {
        self.tables.push((name.into(), table));
        self
    }

    /// Run the pipeline and hand the finished message to the caller.
    pub fn build(self) -> Result<Message, Error> {
        let MessageBuilder {
            sender,
            recipients,
            subject,
            html_body,
            text_body,
            images,
            tables,
        } = self;

        if sender.is_empty() {
            return Err(Error::Configuration("sender address is required".into()));
        }

        let recipients: Vec<String> = recipients.into_iter().filter(|r| !r.is_empty()).collect();
        if recipients.is_empty() {
            return Err(Error::EmptyRecipients);
        }

        if html_body.is_none() && text_body.is_none() {
            return Err(Error::Configuration(
                "either an html or a text body is required".into(),
            ));
        }

        if html_body.is_none() && !images.is_empty() {
            return Err(Error::Configuration(
                "inline images require an html body".into(),
            ));
        }

        check_names(&images, &tables)?;

        // Validate every placeholder before any image byte is read or any
        // part built. Rendering later cannot hit an unknown name.
        for body in html_body.iter().chain(text_body.iter()) {
            for name in template::scan(body) {
                let known = images.iter().any(|(n, _)| *n == name)
                    || tables.iter().any(|(n, _)| *n == name);

                if !known {
                    return Err(Error::UnresolvedPlaceholder(name));
                }
            }
        }

        // Resolve sources into (bytes, subtype) and assign each image a
        // content id unique within this message.
        let mut resolved: Vec<(String, ResolvedImage)> = Vec::new();
        let mut values: HashMap<String, String> = HashMap::new();

        for (name, source) in images {
            let image = source.resolve(&name)?;
            let content_id = format!("{}.{}@redletter", name, Uuid::new_v4().to_simple());

            log::debug!(
                "Resolved inline image {} as image/{} ({} bytes), cid {}",
                name,
                image.subtype,
                image.data.len(),
                content_id
            );

            values.insert(name, format!("<img src=\"cid:{}\">", content_id));
            resolved.push((content_id, image));
        }

        for (name, table) in tables {
            values.insert(name, table.to_html());
        }

        let html = match html_body {
            Some(body) => Some(template::render(&body, &values)?),
            None => None,
        };
        let text = match text_body {
            Some(body) => Some(template::render(&body, &values)?),
            None => None,
        };

        let (content_type, parts) = assemble(html, text, resolved);

        log::debug!(
            "Built {} message for {} ({} top-level parts)",
            content_type,
            recipients.join(", "),
            parts.len()
        );

        Ok(Message {
            sender,
            recipients,
            subject,
            content_type,
            parts,
        })
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        MessageBuilder::new()
    }
}

fn check_names(images: &[(String, ImageSource)], tables: &[(String, Table)]) -> Result<(), Error> {
    for (i, (name, _)) in images.iter().enumerate() {
        if images.iter().skip(i + 1).any(|(n, _)| n == name) {
            return Err(Error::Configuration(format!(
                "image name \"{}\" given more than once",
                name
            )));
        }

        if tables.iter().any(|(n, _)| n == name) {
            return Err(Error::Configuration(format!(
                "\"{}\" names both an image and a table",
                name
            )));
        }
    }

    for (i, (name, _)) in tables.iter().enumerate() {
        if tables.iter().skip(i + 1).any(|(n, _)| n == name) {
            return Err(Error::Configuration(format!(
                "table name \"{}\" given more than once",
                name
            )));
        }
    }

    Ok(())
}

/// Put the rendered bodies and the resolved images into their MIME
/// structure:
///
/// - images present: the html part and every image part share one
///   `multipart/related` container, which sits (after the optional text
///   alternative) under a top-level `multipart/alternative`
/// - no images, both bodies: `multipart/alternative` of text then html
/// - a single body: that part stands alone
fn assemble(
    html: Option<String>,
    text: Option<String>,
    images: Vec<(String, ResolvedImage)>,
) -> (String, Vec<Part>) {
    let html_part = html.map(|body| Part::text("text/html", body));
    let text_part = text.map(|body| Part::text("text/plain", body));

    if !images.is_empty() {
        // Guarded by the builder: images imply an html body
        let html_part = html_part.unwrap();

        let mut related = vec![html_part];
        for (content_id, image) in images {
            related.push(Part::inline_image(&image.subtype, &content_id, image.data));
        }

        let mut parts = Vec::new();
        if let Some(text_part) = text_part {
            parts.push(text_part);
        }
        parts.push(Part::container("multipart/related", related));

        return ("multipart/alternative".to_string(), parts);
    }

    match (text_part, html_part) {
        (Some(text_part), Some(html_part)) => (
            "multipart/alternative".to_string(),
            vec![text_part, html_part],
        ),
        (None, Some(html_part)) => ("text/html".to_string(), vec![html_part]),
        (Some(text_part), None) => ("text/plain".to_string(), vec![text_part]),
        // Guarded by the builder
        (None, None) => unreachable!("a body is validated to exist"),
    }
}
