//! spk3 package layout: chunk tags and the code-chunk section order.
//!
//! ```text
//! RAFF header
//! chunk  F0 9F 93 A6 "spk3"            package
//!   chunk  F0 9F 93 9C "sti0"          type information (opaque here)
//!   chunk  F0 9F 92 BB "scd0"          code
//!     marker F0 9F 91 BE  count:u8    external functions
//!     marker F0 9F 9B 82  count:u32   function declarations
//!     marker F0 9F 90 9C  count:u8    booleans
//!     marker F0 9F 94 A2  count:u8    integers
//!     marker F0 9F 8E BB  count:u8    strings
//!     marker F0 9F 8C B3  count:u8    resource names
//!     marker F0 9F 90 8A  count:u32   function bodies
//! ```

use std::fmt;

use swamp_core::Tag;

/// Package chunk icon.
pub const PACKAGE_ICON: Tag = Tag([0xF0, 0x9F, 0x93, 0xA6]);
/// Package chunk name.
pub const PACKAGE_NAME: Tag = Tag(*b"spk3");
/// Type-information chunk icon.
pub const TYPE_INFO_ICON: Tag = Tag([0xF0, 0x9F, 0x93, 0x9C]);
/// Type-information chunk name.
pub const TYPE_INFO_NAME: Tag = Tag(*b"sti0");
/// Code chunk icon.
pub const CODE_ICON: Tag = Tag([0xF0, 0x9F, 0x92, 0xBB]);
/// Code chunk name.
pub const CODE_NAME: Tag = Tag(*b"scd0");

/// Name of the entry-point function.
pub const ENTRY_NAME: &str = "main";

/// Sections of the code chunk, in stream order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Section {
    /// Host function bindings.
    ExternalFunctions,
    /// Function declarations (name and type, no body).
    FunctionDeclarations,
    /// Boolean literals.
    Booleans,
    /// Integer literals.
    Integers,
    /// String literals.
    Strings,
    /// Resource names, stored as integer handles.
    ResourceNames,
    /// Function bodies, one per declaration.
    FunctionBodies,
}

impl Section {
    /// Every section, in the only order the stream may carry them.
    pub const ORDER: [Section; 7] = [
        Section::ExternalFunctions,
        Section::FunctionDeclarations,
        Section::Booleans,
        Section::Integers,
        Section::Strings,
        Section::ResourceNames,
        Section::FunctionBodies,
    ];

    /// Marker preceding the section.
    pub const fn marker(self) -> Tag {
        match self {
            Section::ExternalFunctions => Tag([0xF0, 0x9F, 0x91, 0xBE]),
            Section::FunctionDeclarations => Tag([0xF0, 0x9F, 0x9B, 0x82]),
            Section::Booleans => Tag([0xF0, 0x9F, 0x90, 0x9C]),
            Section::Integers => Tag([0xF0, 0x9F, 0x94, 0xA2]),
            Section::Strings => Tag([0xF0, 0x9F, 0x8E, 0xBB]),
            Section::ResourceNames => Tag([0xF0, 0x9F, 0x8C, 0xB3]),
            Section::FunctionBodies => Tag([0xF0, 0x9F, 0x90, 0x8A]),
        }
    }

    /// True for the two sections whose entry count is a u32.
    pub const fn has_dword_count(self) -> bool {
        matches!(self, Section::FunctionDeclarations | Section::FunctionBodies)
    }

    /// Short lowercase name, used in logs and listings.
    pub const fn name(self) -> &'static str {
        match self {
            Section::ExternalFunctions => "external functions",
            Section::FunctionDeclarations => "function declarations",
            Section::Booleans => "booleans",
            Section::Integers => "integers",
            Section::Strings => "strings",
            Section::ResourceNames => "resource names",
            Section::FunctionBodies => "function bodies",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}
