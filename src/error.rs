// Error types for the framework
//
// Tree-building and data-binding failures are named and catchable so client
// code can tell a bad menu description from a corrupted state stack. Bounds
// violations (numeric clamping, camera at a world edge) are deliberately not
// errors anywhere in the crate.

use std::fmt;

// ---------------------------------------------------------------------------
// PathError
// ---------------------------------------------------------------------------

/// Errors from dotted-path lookups into a data dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A segment of the path is absent from the dictionary.
    MissingKey { path: String, key: String },
    /// A middle segment resolved to something that has no keys.
    NotAnObject { path: String, key: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey { path, key } => {
                write!(f, "path {path:?}: key {key:?} not found")
            }
            Self::NotAnObject { path, key } => {
                write!(f, "path {path:?}: segment {key:?} is not an object")
            }
        }
    }
}

impl std::error::Error for PathError {}

// ---------------------------------------------------------------------------
// BuildError
// ---------------------------------------------------------------------------

/// Errors when building components or states from a declarative tree.
#[derive(Debug)]
pub enum BuildError {
    /// The `type` key names no known component.
    UnknownComponent(String),
    /// A recognized component is missing a required key.
    InvalidComponent(String),
    /// A `template` value could not be parsed.
    BadTemplate(String),
    /// A `Foreach` source path is absent from the build context.
    MissingContext { path: String },
    /// A state tree has no `name` key.
    StateWithoutName(String),
    /// A component's data binding failed while building.
    Path(PathError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownComponent(kind) => write!(f, "unknown component type {kind:?}"),
            Self::InvalidComponent(msg) => write!(f, "invalid component: {msg}"),
            Self::BadTemplate(msg) => write!(f, "bad template: {msg}"),
            Self::MissingContext { path } => {
                write!(f, "context has no entry for path {path:?}")
            }
            Self::StateWithoutName(tree) => {
                write!(f, "state tree has no name: {tree}")
            }
            Self::Path(e) => write!(f, "data binding: {e}"),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<PathError> for BuildError {
    fn from(e: PathError) -> Self {
        Self::Path(e)
    }
}

// ---------------------------------------------------------------------------
// StackError
// ---------------------------------------------------------------------------

/// State-stack corruption. Unlike a stray unsubscribe, which is downgraded to
/// a feedback diagnostic, these abort the transition that triggered them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    /// A previous-state request named an ancestor that is not on the stack.
    TargetNotFound { target: String },
    /// A transition was requested while the stack held no states.
    Empty,
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetNotFound { target } => {
                write!(f, "previous-state target {target:?} is not on the stack")
            }
            Self::Empty => write!(f, "state stack is empty"),
        }
    }
}

impl std::error::Error for StackError {}

// ---------------------------------------------------------------------------
// Error — top-level
// ---------------------------------------------------------------------------

/// Top-level error type for the framework.
#[derive(Debug)]
pub enum Error {
    Path(PathError),
    Build(BuildError),
    Stack(StackError),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(e) => write!(f, "path: {e}"),
            Self::Build(e) => write!(f, "build: {e}"),
            Self::Stack(e) => write!(f, "stack: {e}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Path(e) => Some(e),
            Self::Build(e) => Some(e),
            Self::Stack(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<PathError> for Error {
    fn from(e: PathError) -> Self {
        Self::Path(e)
    }
}

impl From<BuildError> for Error {
    fn from(e: BuildError) -> Self {
        Self::Build(e)
    }
}

impl From<StackError> for Error {
    fn from(e: StackError) -> Self {
        Self::Stack(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
