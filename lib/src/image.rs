use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// An inline image source, as accepted by the message builder.
///
/// All forms collapse into (subtype, bytes) exactly once, when the
/// message is built. Nothing is cached across builds.
pub enum ImageSource {
    /// Read from the filesystem; subtype from the extension or the content
    Path(PathBuf),
    /// In-memory bytes with an optional caller-supplied subtype
    Bytes {
        data: Vec<u8>,
        subtype: Option<String>,
    },
    /// A byte-stream handle, drained on resolution
    Reader(Box<dyn Read + Send>),
    /// Explicit descriptor, bypassing all inference
    Descriptor {
        maintype: String,
        subtype: String,
        content: Vec<u8>,
    },
}

/// An image normalized to raw bytes and a MIME subtype.
#[derive(Clone, Debug)]
pub struct ResolvedImage {
    pub subtype: String,
    pub data: Vec<u8>,
}

impl ImageSource {
    pub fn path<P: AsRef<Path>>(path: P) -> Self {
        ImageSource::Path(path.as_ref().to_path_buf())
    }

    pub fn bytes(data: Vec<u8>) -> Self {
        ImageSource::Bytes {
            data,
            subtype: None,
        }
    }

    pub fn bytes_with_subtype(data: Vec<u8>, subtype: &str) -> Self {
        ImageSource::Bytes {
            data,
            subtype: Some(subtype.to_string()),
        }
    }

    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        ImageSource::Reader(Box::new(reader))
    }

    pub fn descriptor(maintype: &str, subtype: &str, content: Vec<u8>) -> Self {
        ImageSource::Descriptor {
            maintype: maintype.to_string(),
            subtype: subtype.to_string(),
            content,
        }
    }

    /// Normalize this source into bytes plus a subtype.
    ///
    /// `name` is the placeholder key, used only for error context.
    pub fn resolve(self, name: &str) -> Result<ResolvedImage, Error> {
        match self {
            ImageSource::Path(path) => {
                let data = fs::read(&path)?;
                let subtype = subtype_from_path(&path)
                    .or_else(|| sniff_subtype(&data).map(str::to_string));

                match subtype {
                    Some(subtype) => Ok(ResolvedImage { subtype, data }),
                    None => Err(Error::UnsupportedImageSource(format!(
                        "{}: cannot determine image type of {}",
                        name,
                        path.display()
                    ))),
                }
            }
            ImageSource::Bytes { data, subtype } => {
                let subtype = subtype.or_else(|| sniff_subtype(&data).map(str::to_string));

                match subtype {
                    Some(subtype) => Ok(ResolvedImage { subtype, data }),
                    None => Err(Error::UnsupportedImageSource(format!(
                        "{}: cannot determine image type from content",
                        name
                    ))),
                }
            }
            ImageSource::Reader(mut reader) => {
                let mut data = Vec::new();
                reader.read_to_end(&mut data)?;

                match sniff_subtype(&data) {
                    Some(subtype) => Ok(ResolvedImage {
                        subtype: subtype.to_string(),
                        data,
                    }),
                    None => Err(Error::UnsupportedImageSource(format!(
                        "{}: cannot determine image type from stream",
                        name
                    ))),
                }
            }
            ImageSource::Descriptor {
                maintype,
                subtype,
                content,
            } => {
                // Only image/* can be embedded with a cid reference
                if maintype != "image" {
                    return Err(Error::UnsupportedImageSource(format!(
                        "{}: maintype \"{}\" cannot be embedded inline",
                        name, maintype
                    )));
                }

                Ok(ResolvedImage {
                    subtype,
                    data: content,
                })
            }
        }
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ImageSource::Path(ref path) => f.debug_tuple("Path").field(path).finish(),
            ImageSource::Bytes {
                ref data,
                ref subtype,
            } => f
                .debug_struct("Bytes")
                .field("len", &data.len())
                .field("subtype", subtype)
                .finish(),
            ImageSource::Reader(_) => f.write_str("Reader(..)"),
            ImageSource::Descriptor {
                ref maintype,
                ref subtype,
                ref content,
            } => f
                .debug_struct("Descriptor")
                .field("maintype", maintype)
                .field("subtype", subtype)
                .field("len", &content.len())
                .finish(),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::path(path)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(data: Vec<u8>) -> Self {
        ImageSource::bytes(data)
    }
}

impl From<&[u8]> for ImageSource {
    fn from(data: &[u8]) -> Self {
        ImageSource::bytes(data.to_vec())
    }
}

fn subtype_from_path(path: &Path) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .map(|mime| mime.subtype().as_str().to_string())
}

/// Best-effort magic number check for the formats mail clients render.
fn sniff_subtype(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if data.starts_with(b"\xff\xd8\xff") {
        Some("jpeg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("gif")
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("webp")
    } else if data.starts_with(b"BM") {
        Some("bmp")
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;

    // Magic bytes are all the resolver looks at
    const PNG_BYTES: &[u8] =
        b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01\x00\x00\x00\x01";

    fn temp_png() -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "redletter-test-{}.png",
            uuid::Uuid::new_v4().to_simple()
        ));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(PNG_BYTES).unwrap();
        path
    }

    #[test]
    fn resolve_from_path() {
        let path = temp_png();
        let image = ImageSource::path(&path).resolve("img").unwrap();

        assert_eq!(image.subtype, "png");
        assert_eq!(image.data, PNG_BYTES);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn resolve_from_bytes() {
        let image = ImageSource::bytes(PNG_BYTES.to_vec()).resolve("img").unwrap();

        assert_eq!(image.subtype, "png");
        assert_eq!(image.data, PNG_BYTES);
    }

    #[test]
    fn resolve_from_reader() {
        let reader = Cursor::new(PNG_BYTES.to_vec());
        let image = ImageSource::reader(reader).resolve("img").unwrap();

        assert_eq!(image.subtype, "png");
        assert_eq!(image.data, PNG_BYTES);
    }

    #[test]
    fn resolve_from_descriptor() {
        let image = ImageSource::descriptor("image", "png", PNG_BYTES.to_vec())
            .resolve("img")
            .unwrap();

        assert_eq!(image.subtype, "png");
        assert_eq!(image.data, PNG_BYTES);
    }

    #[test]
    fn caller_subtype_wins_over_sniffing() {
        let image = ImageSource::bytes_with_subtype(PNG_BYTES.to_vec(), "x-custom")
            .resolve("img")
            .unwrap();

        assert_eq!(image.subtype, "x-custom");
    }

    #[test]
    fn sniff_jpeg() {
        let image = ImageSource::bytes(b"\xff\xd8\xff\xe0rest".to_vec())
            .resolve("img")
            .unwrap();

        assert_eq!(image.subtype, "jpeg");
    }

    #[test]
    fn unknown_content_is_rejected() {
        let err = ImageSource::bytes(b"not an image".to_vec())
            .resolve("img")
            .unwrap_err();

        assert!(match err {
            Error::UnsupportedImageSource(_) => true,
            _ => false,
        });
    }

    #[test]
    fn non_image_descriptor_is_rejected() {
        let err = ImageSource::descriptor("application", "pdf", b"%PDF".to_vec())
            .resolve("doc")
            .unwrap_err();

        assert!(match err {
            Error::UnsupportedImageSource(_) => true,
            _ => false,
        });
    }
}
