//! The compiler service.
//!
//! Turns a [`CompilationUnit`] into an in-memory WebAssembly binary. The unit's text
//! is a sequence of WAT module fields; the compiler wraps it into a module named
//! after the unit, encodes it with `wast`, validates the result and checks every
//! import and manifest against the available [`Reference`]s. Nothing touches the
//! filesystem, and every call starts from a fresh parser and validator, so the
//! same unit and references always produce the same bytes.

use std::collections::HashSet ;
use nonempty_collections::NEVec ;
use wast::parser::{ self, ParseBuffer };
use wast::Wat ;

use crate::diagnostic::{ self, Diagnostic, Location };
use crate::manifest::{ manifest_sections, ExtensionManifest };
use crate::reference::{ ModuleInterface, Reference };
use crate::source::CompilationUnit ;



/// Knobs of the [`Compiler`].
#[derive( Copy, Clone, Debug, Default, PartialEq, Eq )]
pub struct CompilerOptions {
	/// Treat every warning as an error.
	pub warnings_as_errors: bool,
}

/// A successfully compiled module.
#[derive( Clone, Debug, PartialEq, Eq )]
pub struct BinaryImage {
	module_name: String,
	bytes: Vec<u8>,
	warnings: Vec<Diagnostic>,
}

impl BinaryImage {

	#[inline] pub fn module_name( &self ) -> &str { &self.module_name }

	/// The encoded WebAssembly module.
	#[inline] pub fn bytes( &self ) -> &[u8] { &self.bytes }

	/// Warnings that didn't fail the compilation.
	#[inline] pub fn warnings( &self ) -> &[Diagnostic] { &self.warnings }

}

/// Outcome of a compilation: an image, or at least one error diagnostic.
#[derive( Clone, Debug, PartialEq, Eq )]
pub enum CompilationResult {
	Success( BinaryImage ),
	Failure( NEVec<Diagnostic> ),
}

impl CompilationResult {

	#[inline] pub fn is_success( &self ) -> bool { matches!( self, Self::Success( _ )) }

	/// Converts into a `Result` so the outcome can be propagated with `?`.
	///
	/// # Errors
	/// Returns the diagnostics of a failed compilation.
	pub fn into_result( self ) -> Result<BinaryImage, NEVec<Diagnostic>> {
		match self {
			Self::Success( image ) => Ok( image ),
			Self::Failure( diagnostics ) => Err( diagnostics ),
		}
	}

}

/// Compiles WAT compilation units into binary images.
#[derive( Copy, Clone, Debug, Default )]
pub struct Compiler {
	options: CompilerOptions,
}

impl Compiler {

	pub fn new( options: CompilerOptions ) -> Self { Self { options }}

	#[inline] pub fn options( &self ) -> CompilerOptions { self.options }

	/// Compiles `unit` against `references`.
	///
	/// Syntax and validation errors stop the compilation immediately; link and
	/// manifest checks report every problem they find.
	pub fn compile( &self, unit: &CompilationUnit, references: &[Reference] ) -> CompilationResult {

		let bytes = match encode( unit ) {
			Ok( bytes ) => bytes,
			Err( diagnostic ) => return CompilationResult::Failure( NEVec::new( diagnostic )),
		};

		if let Err( err ) = wasmparser::Validator::new().validate_all( &bytes ) {
			return CompilationResult::Failure( NEVec::new( Diagnostic::error(
				diagnostic::VALIDATION_ERROR,
				err.message(),
				Location::Binary { offset: err.offset() },
			)));
		}

		let ( errors, warnings ): ( Vec<_>, Vec<_> ) = link_check( unit, &bytes, references )
			.into_iter()
			.chain( manifest_check( unit, &bytes ))
			.map(| diagnostic | match self.options.warnings_as_errors {
				true => diagnostic.escalate(),
				false => diagnostic,
			})
			.partition( Diagnostic::is_error );

		match NEVec::try_from_vec( errors ) {
			Some( errors ) => CompilationResult::Failure( errors ),
			None => CompilationResult::Success( BinaryImage {
				module_name: unit.module_name().to_string(),
				bytes,
				warnings,
			}),
		}

	}

}

fn encode( unit: &CompilationUnit ) -> Result<Vec<u8>, Diagnostic> {

	let prefix = format!( "(module ${}\n", module_id( unit.module_name() ));
	let text = format!( "{}{}\n)", prefix, unit.text() );

	let syntax_error = | err: wast::Error | {
		let location = err.span().offset()
			.checked_sub( prefix.len() )
			.filter(| offset | *offset <= unit.text().len() )
			.map_or( Location::Unknown, | offset | unit.locate( offset ));
		Diagnostic::error( diagnostic::SYNTAX_ERROR, err.message(), location )
	};

	let buffer = ParseBuffer::new( &text ).map_err( syntax_error )?;
	let mut module = parser::parse::<Wat>( &buffer ).map_err( syntax_error )?;
	module.encode().map_err( syntax_error )

}

/// A WAT identifier derived from the module name.
fn module_id( name: &str ) -> String {
	let id = name.chars()
		.map(| c | match c.is_ascii_alphanumeric() || matches!( c, '_' | '-' | '.' ) {
			true => c,
			false => '_',
		})
		.collect::<String>();
	match id.is_empty() {
		true => "module".to_string(),
		false => id,
	}
}

fn link_check( unit: &CompilationUnit, bytes: &[u8], references: &[Reference] ) -> Vec<Diagnostic> {

	let interface = match ModuleInterface::inspect( bytes ) {
		Ok( interface ) => interface,
		Err( err ) => return vec![ Diagnostic::error( diagnostic::VALIDATION_ERROR, err.to_string(), Location::Unknown ) ],
	};

	interface.imports.iter()
		.filter_map(| import | {

			// Best effort: point at the first place the import is spelled out.
			let location = unit.text()
				.find( &format!( "\"{}\" \"{}\"", import.module, import.name ))
				.map_or( Location::Unknown, | offset | unit.locate( offset ));

			let Some( reference ) = references.iter().find(| reference | reference.name() == import.module ) else {
				return Some( Diagnostic::error(
					diagnostic::UNRESOLVED_IMPORT,
					format!( "No reference named `{}` (imported `{}`)", import.module, import.name ),
					location,
				));
			};

			match reference.symbol( &import.name ) {
				None => Some( Diagnostic::error(
					diagnostic::UNRESOLVED_IMPORT,
					format!( "Reference `{}` has no export named `{}`", import.module, import.name ),
					location,
				)),
				Some( provided ) if !import.symbol.accepts( provided ) => Some( Diagnostic::error(
					diagnostic::IMPORT_MISMATCH,
					format!( "Import `{}::{}` expects {} but the reference provides {}", import.module, import.name, import.symbol, provided ),
					location,
				)),
				Some( _ ) => None,
			}

		})
		.collect()

}

fn manifest_check( unit: &CompilationUnit, bytes: &[u8] ) -> Vec<Diagnostic> {

	let sections = match manifest_sections( bytes ) {
		Ok( sections ) => sections,
		Err( err ) => return vec![ Diagnostic::error(
			diagnostic::MALFORMED_MANIFEST,
			err.message(),
			Location::Binary { offset: err.offset() },
		)],
	};

	let mut declared = HashSet::new();
	let mut diagnostics = Vec::new();

	for data in sections {

		let manifest = match ExtensionManifest::parse( data ) {
			Ok( manifest ) => manifest,
			Err( err ) => {
				diagnostics.push( Diagnostic::error(
					diagnostic::MALFORMED_MANIFEST,
					format!( "Malformed extension manifest: {}", err ),
					Location::Unknown,
				));
				continue ;
			}
		};

		let location = unit.text()
			.find( manifest.type_name() )
			.map_or( Location::Unknown, | offset | unit.locate( offset ));

		if !declared.insert( manifest.type_name().to_string() ) {
			diagnostics.push( Diagnostic::error(
				diagnostic::DUPLICATE_TYPE,
				format!( "Type `{}` is declared more than once", manifest.type_name() ),
				location.clone(),
			));
		}

		manifest.unknown_keys().for_each(| key | diagnostics.push( Diagnostic::warning(
			diagnostic::UNKNOWN_MANIFEST_KEY,
			format!( "Manifest of `{}` has unknown key `{}`", manifest.type_name(), key ),
			location.clone(),
		)));

	}

	diagnostics

}
