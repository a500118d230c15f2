//! Composition and dispatch of templated multipart emails.
//!
//! Bodies are template strings with `{{ name }}` placeholders. Named
//! images become inline MIME parts referenced from the HTML through
//! generated content ids; named tables render to HTML fragments in
//! place. The result is a [`Message`] value that an SMTP client (see
//! [`EmailSender`]) or any other transport can serialize and deliver.

pub mod config;
pub mod error;
pub mod image;
pub mod message;
pub mod sender;
pub mod table;

mod mime;
mod template;

pub use error::Error;
pub use image::ImageSource;
pub use message::{Message, MessageBuilder, Part, PartBody};
pub use sender::EmailSender;
pub use table::Table;
