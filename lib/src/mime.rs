//! Wire form of a [`Message`](crate::message::Message).
//!
//! Produces the RFC 5322 text handed to the SMTP transport: headers,
//! boundary-delimited multipart containers, utf-8 text parts and
//! base64-encoded binary parts.

use uuid::Uuid;

use crate::message::{Message, Part, PartBody};

pub(crate) fn to_wire(msg: &Message) -> String {
    let mut out = String::new();

    write_header(&mut out, "From", msg.sender());
    write_header(&mut out, "To", &msg.recipients().join(", "));
    write_header(&mut out, "Subject", msg.subject());
    write_header(&mut out, "MIME-Version", "1.0");

    if msg.content_type().starts_with("multipart/") {
        let boundary = new_boundary();
        write_header(
            &mut out,
            "Content-Type",
            &format!("{}; boundary=\"{}\"", msg.content_type(), boundary),
        );
        out.push_str("\r\n");

        for part in msg.parts() {
            out.push_str(&format!("--{}\r\n", boundary));
            write_part(&mut out, part);
        }
        out.push_str(&format!("--{}--\r\n", boundary));
    } else {
        // Single-part message: the lone part carries the whole body
        write_leaf(&mut out, &msg.parts()[0]);
    }

    out
}

fn write_part(out: &mut String, part: &Part) {
    if part.children().is_empty() {
        write_leaf(out, part);
        return;
    }

    let boundary = new_boundary();
    write_header(
        out,
        "Content-Type",
        &format!("{}; boundary=\"{}\"", part.content_type(), boundary),
    );
    out.push_str("\r\n");

    for child in part.children() {
        out.push_str(&format!("--{}\r\n", boundary));
        write_part(out, child);
    }
    out.push_str(&format!("--{}--\r\n", boundary));
}

fn write_leaf(out: &mut String, part: &Part) {
    match *part.body() {
        PartBody::Text(ref text) => {
            write_header(
                out,
                "Content-Type",
                &format!("{}; charset=\"utf-8\"", part.content_type()),
            );
            for (name, value) in part.headers() {
                write_header(out, name, value);
            }
            write_header(out, "Content-Transfer-Encoding", "8bit");
            out.push_str("\r\n");
            out.push_str(text);
            out.push_str("\r\n");
        }
        PartBody::Binary(ref data) => {
            write_header(out, "Content-Type", part.content_type());
            for (name, value) in part.headers() {
                write_header(out, name, value);
            }
            write_header(out, "Content-Transfer-Encoding", "base64");
            out.push_str("\r\n");

            // Base64 wrapped at 76 columns
            let encoded = base64::encode(data);
            for chunk in encoded.as_bytes().chunks(76) {
                out.push_str(std::str::from_utf8(chunk).unwrap_or(""));
                out.push_str("\r\n");
            }
        }
    }
}

fn write_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str("\r\n");
}

fn new_boundary() -> String {
    format!("----=_Part_{}", Uuid::new_v4().to_simple())
}
