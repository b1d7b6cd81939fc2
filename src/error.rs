// SPDX-License-Identifier: MPL-2.0
use std::fmt;

#[derive(Debug, Clone)]
pub enum Error {
    Io(String),
    Xml(String),
    Config(String),
    Fetch(FetchError),
    Content(ContentError),
}

/// Errors raised while transferring a remote or local resource.
///
/// A failed content-map transfer is fatal (nothing can render); a failed
/// image transfer is recoverable: the owning leaf keeps rendering and the
/// media area degrades to its placeholder.
#[derive(Debug, Clone)]
pub enum FetchError {
    /// The server answered but the resource does not exist (HTTP 404 or a
    /// missing local file).
    NotFound(String),

    /// The transfer failed below the application layer (DNS, connection
    /// reset, TLS, unreadable file).
    Transport(String),

    /// The server answered with a non-success status other than 404.
    Status { url: String, status: u16 },

    /// The transfer was cancelled by its owner before completion.
    Aborted,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::NotFound(url) => write!(f, "Resource not found: {url}"),
            FetchError::Transport(msg) => write!(f, "Transfer failed: {msg}"),
            FetchError::Status { url, status } => {
                write!(f, "Unexpected status {status} for {url}")
            }
            FetchError::Aborted => write!(f, "Transfer aborted"),
        }
    }
}

/// Precondition violations against the content tree.
///
/// These indicate a malformed content map or a programming error and are
/// surfaced immediately rather than swallowed: silently rendering a broken
/// branch stem is worse than failing loudly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// A navigation request referenced an id that no tree node carries.
    UnknownTarget(String),

    /// A navigation request referenced a node that no link on the current
    /// chain points at.
    UnreachableTarget(String),

    /// A node was asked to project itself but has no children to project.
    EmptyNode(String),

    /// The document root element is missing or is not a `root` element.
    MissingRoot,

    /// Two nodes share the same id.
    DuplicateId(String),
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::UnknownTarget(id) => {
                write!(f, "No content node with id `{id}`")
            }
            ContentError::UnreachableTarget(id) => {
                write!(f, "No mounted link navigates to `{id}`")
            }
            ContentError::EmptyNode(id) => {
                write!(f, "Content node `{id}` has no children")
            }
            ContentError::MissingRoot => write!(f, "Content map has no root element"),
            ContentError::DuplicateId(id) => {
                write!(f, "Duplicate content node id `{id}`")
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O Error: {e}"),
            Error::Xml(e) => write!(f, "XML Error: {e}"),
            Error::Config(e) => write!(f, "Config Error: {e}"),
            Error::Fetch(e) => write!(f, "Fetch Error: {e}"),
            Error::Content(e) => write!(f, "Content Error: {e}"),
        }
    }
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        Error::Fetch(err)
    }
}

impl From<ContentError> for Error {
    fn from(err: ContentError) -> Self {
        Error::Content(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_io_error() {
        let err = Error::Io("disk failure".to_string());
        assert_eq!(format!("{}", err), "I/O Error: disk failure");
    }

    #[test]
    fn from_io_error_produces_io_variant() {
        let io_error = std::io::Error::other("boom");
        let err: Error = io_error.into();
        match err {
            Error::Io(message) => assert!(message.contains("boom")),
            _ => panic!("expected Io variant"),
        }
    }

    #[test]
    fn fetch_not_found_mentions_url() {
        let err: Error = FetchError::NotFound("maps/content.xml".into()).into();
        assert!(format!("{}", err).contains("maps/content.xml"));
    }

    #[test]
    fn fetch_status_formats_code() {
        let err = FetchError::Status {
            url: "http://example.test/a.png".into(),
            status: 503,
        };
        assert!(format!("{}", err).contains("503"));
    }

    #[test]
    fn unknown_target_formats_id() {
        let err: Error = ContentError::UnknownTarget("leaf-9".into()).into();
        assert_eq!(
            format!("{}", err),
            "Content Error: No content node with id `leaf-9`"
        );
    }

    #[test]
    fn content_errors_compare_by_value() {
        assert_eq!(
            ContentError::DuplicateId("a".into()),
            ContentError::DuplicateId("a".into())
        );
        assert_ne!(
            ContentError::EmptyNode("a".into()),
            ContentError::EmptyNode("b".into())
        );
    }
}
