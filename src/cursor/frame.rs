use crate::error::ViewerError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The role a compiled script plays in a concatenated evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FrameKind {
    Isolated,
    Unlocking,
    Locking,
    Tested,
    TestSetup,
    TestCheck,
}

impl FrameKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FrameKind::Isolated => "isolated",
            FrameKind::Unlocking => "unlocking",
            FrameKind::Locking => "locking",
            FrameKind::Tested => "tested",
            FrameKind::TestSetup => "test-setup",
            FrameKind::TestCheck => "test-check",
        }
    }
}

impl TryFrom<&str> for FrameKind {
    type Error = ViewerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "isolated" => Ok(FrameKind::Isolated),
            "unlocking" => Ok(FrameKind::Unlocking),
            "locking" => Ok(FrameKind::Locking),
            "tested" => Ok(FrameKind::Tested),
            "test-setup" => Ok(FrameKind::TestSetup),
            "test-check" => Ok(FrameKind::TestCheck),
            other => Err(ViewerError::UnknownFrameKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for FrameKind {
    type Error = ViewerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FrameKind::try_from(value.as_str())
    }
}

impl From<FrameKind> for String {
    fn from(kind: FrameKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the tested locking construct is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockingType {
    #[default]
    Standard,
    P2sh20,
    P2sh32,
}

impl LockingType {
    /// Non-standard types run redemption-script bookkeeping before the
    /// visible script.
    pub fn has_redemption_boilerplate(self) -> bool {
        self != LockingType::Standard
    }
}

/// Which script is being edited, which decides the frames evaluated with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EditorMode {
    /// A script evaluated on its own behind a virtual, empty unlocking script.
    Isolated,
    /// An unlocking script followed by the locking script it unlocks.
    ScriptPair {
        #[serde(rename = "lockingType", default)]
        locking_type: LockingType,
    },
    /// A test setup, the tested script and the test check.
    TestedScript {
        #[serde(default)]
        pushed: bool,
    },
}

impl EditorMode {
    pub fn evaluation_order(self) -> &'static [FrameKind] {
        match self {
            EditorMode::Isolated => &[FrameKind::Isolated],
            EditorMode::ScriptPair { .. } => &[FrameKind::Unlocking, FrameKind::Locking],
            EditorMode::TestedScript { .. } => &[
                FrameKind::TestSetup,
                FrameKind::Tested,
                FrameKind::TestCheck,
            ],
        }
    }

    pub fn locking_type(self) -> LockingType {
        match self {
            EditorMode::ScriptPair { locking_type } => locking_type,
            EditorMode::Isolated | EditorMode::TestedScript { .. } => LockingType::P2sh20,
        }
    }

    /// `true` when the tested script is pushed as data before the check runs.
    pub fn is_pushed(self) -> bool {
        matches!(self, EditorMode::TestedScript { pushed: true })
    }
}
