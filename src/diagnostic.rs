//! Compiler diagnostics.
//!
//! Every problem the [`Compiler`]( crate::Compiler ) finds is reported as a
//! [`Diagnostic`]. Only diagnostics with [`Severity::Error`] fail a compilation unit;
//! warnings are carried along with the produced image unless the compiler was told
//! to escalate them.

use std::path::PathBuf ;



/// Syntax error in the aggregated source text.
pub const SYNTAX_ERROR: &str = "WAT0001" ;
/// The encoded binary failed validation.
pub const VALIDATION_ERROR: &str = "WASM0001" ;
/// An import names a module or field that no reference provides.
pub const UNRESOLVED_IMPORT: &str = "LNK0001" ;
/// An import resolves to a reference symbol of a different kind or signature.
pub const IMPORT_MISMATCH: &str = "LNK0002" ;
/// An `extension` custom section does not hold a valid manifest.
pub const MALFORMED_MANIFEST: &str = "EXT0001" ;
/// Two manifests declare the same type.
pub const DUPLICATE_TYPE: &str = "EXT0002" ;
/// A manifest carries a key the loader does not understand.
pub const UNKNOWN_MANIFEST_KEY: &str = "EXT0003" ;

/// How serious a [`Diagnostic`] is.
#[derive( Copy, Clone, Debug, PartialEq, Eq, Hash )]
pub enum Severity {
	Warning,
	Error,
}

impl std::fmt::Display for Severity {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		match self {
			Self::Warning => write!( f, "warning" ),
			Self::Error => write!( f, "error" ),
		}
	}
}

/// Where a [`Diagnostic`] points to.
#[derive( Clone, Debug, PartialEq, Eq )]
pub enum Location {
	/// A position inside one of the original source files (1-based line and column).
	Source { file: PathBuf, line: usize, column: usize },
	/// A byte offset inside the encoded binary image.
	Binary { offset: usize },
	/// The problem can't be tied to a position.
	Unknown,
}

impl std::fmt::Display for Location {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		match self {
			Self::Source { file, line, column } => write!( f, "{}:{}:{}", file.display(), line, column ),
			Self::Binary { offset } => write!( f, "offset {:#x}", offset ),
			Self::Unknown => write!( f, "<unknown>" ),
		}
	}
}

/// A single compiler finding.
#[derive( Clone, Debug, PartialEq, Eq )]
pub struct Diagnostic {
	id: &'static str,
	message: String,
	severity: Severity,
	location: Location,
}

impl Diagnostic {

	/// Creates an error-severity diagnostic.
	pub fn error( id: &'static str, message: impl Into<String>, location: Location ) -> Self {
		Self { id, message: message.into(), severity: Severity::Error, location }
	}

	/// Creates a warning-severity diagnostic.
	pub fn warning( id: &'static str, message: impl Into<String>, location: Location ) -> Self {
		Self { id, message: message.into(), severity: Severity::Warning, location }
	}

	/// Turns a warning into an error. Errors are returned unchanged.
	pub(crate) fn escalate( self ) -> Self {
		Self { severity: Severity::Error, ..self }
	}

	/// Identifier code such as `WAT0001`.
	#[inline] pub fn id( &self ) -> &'static str { self.id }

	/// Human readable description.
	#[inline] pub fn message( &self ) -> &str { &self.message }

	#[inline] pub fn severity( &self ) -> Severity { self.severity }

	#[inline] pub fn location( &self ) -> &Location { &self.location }

	/// Whether this diagnostic fails the compilation unit.
	#[inline] pub fn is_error( &self ) -> bool { self.severity == Severity::Error }

}

impl std::fmt::Display for Diagnostic {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		write!( f, "{}: {} at {}", self.id, self.message, self.location )
	}
}
