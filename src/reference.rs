//! Reference resolution.
//!
//! A [`Reference`] is a named set of symbols that compiled extension code may
//! import. References come from two places:
//!
//! - every library module (by default `*.wasm`) sitting directly in the references
//! 	directory; the file stem becomes the import module name and the library's
//! 	exports become its symbols,
//! - the host's own [`HostLibrary`], which exposes the host's core functions.
//!
//! References are re-read from disk on every call to [`resolve_references`], so
//! dropping a new library into the directory and restarting picks it up.

use std::collections::BTreeMap ;
use std::ffi::OsStr ;
use std::path::{ Path, PathBuf };
use itertools::Itertools ;
use thiserror::Error ;
use wasmparser::{ ExternalKind, Parser, Payload, TypeRef };

use crate::host::HostLibrary ;



/// Errors raised while collecting references.
#[derive( Debug, Error )]
pub enum ReferenceError {
	/// The references directory or one of its files couldn't be read.
	#[error( "Failed to read {}: {source}", .path.display() )]
	Io { path: PathBuf, source: std::io::Error },
	/// A library file isn't a valid WebAssembly module.
	#[error( "Malformed reference {}: {message}", .path.display() )]
	Malformed { path: PathBuf, message: String },
	/// Two references would be imported under the same module name.
	#[error( "Duplicate reference name: {name}" )]
	Duplicate { name: String },
}

/// A WebAssembly value type as seen by the link checks.
#[derive( Copy, Clone, Debug, PartialEq, Eq, Hash )]
pub enum ValueKind {
	I32,
	I64,
	F32,
	F64,
	V128,
	FuncRef,
	ExternRef,
	/// Any other reference type (GC proposal types and the like).
	OtherRef,
}

impl From<wasmparser::ValType> for ValueKind {
	fn from( ty: wasmparser::ValType ) -> Self { match ty {
		wasmparser::ValType::I32 => Self::I32,
		wasmparser::ValType::I64 => Self::I64,
		wasmparser::ValType::F32 => Self::F32,
		wasmparser::ValType::F64 => Self::F64,
		wasmparser::ValType::V128 => Self::V128,
		wasmparser::ValType::Ref( ty ) if ty == wasmparser::RefType::FUNCREF => Self::FuncRef,
		wasmparser::ValType::Ref( ty ) if ty == wasmparser::RefType::EXTERNREF => Self::ExternRef,
		wasmparser::ValType::Ref( _ ) => Self::OtherRef,
	}}
}

impl ValueKind {
	/// The matching wasmtime type, if the host can declare one.
	pub(crate) fn to_val_type( self ) -> Option<wasmtime::ValType> { match self {
		Self::I32 => Some( wasmtime::ValType::I32 ),
		Self::I64 => Some( wasmtime::ValType::I64 ),
		Self::F32 => Some( wasmtime::ValType::F32 ),
		Self::F64 => Some( wasmtime::ValType::F64 ),
		Self::V128 => Some( wasmtime::ValType::V128 ),
		Self::FuncRef => Some( wasmtime::ValType::FUNCREF ),
		Self::ExternRef => Some( wasmtime::ValType::EXTERNREF ),
		Self::OtherRef => None,
	}}
}

impl std::fmt::Display for ValueKind {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		let name = match self {
			Self::I32 => "i32",
			Self::I64 => "i64",
			Self::F32 => "f32",
			Self::F64 => "f64",
			Self::V128 => "v128",
			Self::FuncRef => "funcref",
			Self::ExternRef => "externref",
			Self::OtherRef => "ref",
		};
		write!( f, "{}", name )
	}
}

/// Parameter and result types of a function.
#[derive( Clone, Debug, PartialEq, Eq, Hash, Default )]
pub struct Signature {
	params: Vec<ValueKind>,
	results: Vec<ValueKind>,
}

impl Signature {

	pub fn new(
		params: impl IntoIterator<Item = ValueKind>,
		results: impl IntoIterator<Item = ValueKind>,
	) -> Self {
		Self { params: params.into_iter().collect(), results: results.into_iter().collect() }
	}

	#[inline] pub fn params( &self ) -> &[ValueKind] { &self.params }
	#[inline] pub fn results( &self ) -> &[ValueKind] { &self.results }

}

impl From<&wasmparser::FuncType> for Signature {
	fn from( ty: &wasmparser::FuncType ) -> Self {
		Self::new(
			ty.params().iter().copied().map( ValueKind::from ),
			ty.results().iter().copied().map( ValueKind::from ),
		)
	}
}

impl std::fmt::Display for Signature {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		write!( f, "({}) -> ({})", self.params.iter().join( ", " ), self.results.iter().join( ", " ))
	}
}

/// Something a reference exports.
#[derive( Clone, Debug, PartialEq, Eq )]
pub enum Symbol {
	Func( Signature ),
	Table,
	Memory,
	Global,
	Tag,
}

impl Symbol {

	/// Whether an import declared as `self` can be satisfied by `provided`.
	pub fn accepts( &self, provided: &Symbol ) -> bool {
		match ( self, provided ) {
			( Self::Func( expected ), Self::Func( provided )) => expected == provided,
			( Self::Table, Self::Table )
			| ( Self::Memory, Self::Memory )
			| ( Self::Global, Self::Global )
			| ( Self::Tag, Self::Tag ) => true,
			_ => false,
		}
	}

}

impl std::fmt::Display for Symbol {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		match self {
			Self::Func( signature ) => write!( f, "func {}", signature ),
			Self::Table => write!( f, "table" ),
			Self::Memory => write!( f, "memory" ),
			Self::Global => write!( f, "global" ),
			Self::Tag => write!( f, "tag" ),
		}
	}
}

/// Where a [`Reference`] came from.
#[derive( Clone, Debug )]
pub enum ReferenceOrigin {
	/// A library module read from the references directory.
	Library { path: PathBuf, bytes: Vec<u8> },
	/// The host's core library.
	Host,
}

/// A named set of symbols extension code can import from.
#[derive( Clone, Debug )]
pub struct Reference {
	name: String,
	origin: ReferenceOrigin,
	symbols: BTreeMap<String, Symbol>,
}

impl Reference {

	pub(crate) fn new( name: impl Into<String>, origin: ReferenceOrigin, symbols: BTreeMap<String, Symbol> ) -> Self {
		Self { name: name.into(), origin, symbols }
	}

	/// Reads a library module and collects its exports.
	///
	/// # Errors
	/// Fails if the file can't be read or isn't a valid module.
	pub fn from_library( path: &Path ) -> Result<Self, ReferenceError> {

		let bytes = std::fs::read( path ).map_err(| source | ReferenceError::Io { path: path.to_path_buf(), source })?;
		let malformed = | message: String | ReferenceError::Malformed { path: path.to_path_buf(), message };

		wasmparser::Validator::new()
			.validate_all( &bytes )
			.map_err(| err | malformed( err.message().to_string() ))?;
		let interface = ModuleInterface::inspect( &bytes ).map_err(| err | malformed( err.to_string() ))?;

		let name = path.file_stem()
			.map_or_else( String::new, | stem | stem.to_string_lossy().into_owned() );
		Ok( Self::new( name, ReferenceOrigin::Library { path: path.to_path_buf(), bytes }, interface.exports ))

	}

	/// Import module name under which the symbols are reachable.
	#[inline] pub fn name( &self ) -> &str { &self.name }

	#[inline] pub fn origin( &self ) -> &ReferenceOrigin { &self.origin }

	#[inline] pub fn symbols( &self ) -> &BTreeMap<String, Symbol> { &self.symbols }

	#[inline] pub fn symbol( &self, name: &str ) -> Option<&Symbol> { self.symbols.get( name ) }

}

/// Collects the references a compilation unit may use.
///
/// Libraries are taken from the files directly inside `directory` whose extension
/// equals `extension`, in file name order. The host library is appended last.
///
/// # Errors
/// Fails if the directory or a library can't be read, a library is malformed, or
/// two references share a name.
pub fn resolve_references<H: 'static>(
	directory: &Path,
	extension: &str,
	host_library: &HostLibrary<H>,
) -> Result<Vec<Reference>, ReferenceError> {

	let io_error = | source | ReferenceError::Io { path: directory.to_path_buf(), source };

	let mut references = std::fs::read_dir( directory )
		.map_err( io_error )?
		.map(| entry | entry.map(| entry | entry.path() ))
		.collect::<Result<Vec<_>, _>>()
		.map_err( io_error )?
		.into_iter()
		.filter(| path | path.is_file() && path.extension() == Some( OsStr::new( extension )))
		.sorted()
		.map(| path | Reference::from_library( &path ))
		.collect::<Result<Vec<_>, _>>()?;
	references.push( host_library.reference() );

	if let Some( name ) = references.iter().map( Reference::name ).duplicates().next() {
		return Err( ReferenceError::Duplicate { name: name.to_string() });
	}

	tracing::debug!(
		references = %references.iter().map( Reference::name ).join( ", " ),
		"Resolved references",
	);
	Ok( references )

}

#[derive( Debug, Error )]
pub(crate) enum InterfaceError {
	#[error( transparent )] Reader( #[from] wasmparser::BinaryReaderError ),
	#[error( "Type index {0} is out of bounds" )] UnknownType( u32 ),
	#[error( "Function index {0} is out of bounds" )] UnknownFunction( u32 ),
}

/// One import of a module.
#[derive( Clone, Debug )]
pub(crate) struct ImportEntry {
	pub module: String,
	pub name: String,
	pub symbol: Symbol,
}

/// The imports and exports of a binary module.
#[derive( Clone, Debug, Default )]
pub(crate) struct ModuleInterface {
	pub imports: Vec<ImportEntry>,
	pub exports: BTreeMap<String, Symbol>,
}

impl ModuleInterface {

	pub fn inspect( bytes: &[u8] ) -> Result<Self, InterfaceError> {

		let mut types = Vec::new();
		let mut functions = Vec::new();
		let mut interface = Self::default();

		let signature_at = | types: &[Signature], index: u32 | types
			.get( index as usize )
			.cloned()
			.ok_or( InterfaceError::UnknownType( index ));

		for payload in Parser::new( 0 ).parse_all( bytes ) {
			match payload? {
				Payload::TypeSection( reader ) => for ty in reader.into_iter_err_on_gc_types() {
					types.push( Signature::from( &ty? ));
				},
				Payload::ImportSection( reader ) => for import in reader {
					let import = import?;
					let symbol = match import.ty {
						TypeRef::Func( index ) => {
							functions.push( index );
							Symbol::Func( signature_at( &types, index )? )
						},
						TypeRef::Table( _ ) => Symbol::Table,
						TypeRef::Memory( _ ) => Symbol::Memory,
						TypeRef::Global( _ ) => Symbol::Global,
						TypeRef::Tag( _ ) => Symbol::Tag,
					};
					interface.imports.push( ImportEntry {
						module: import.module.to_string(),
						name: import.name.to_string(),
						symbol,
					});
				},
				Payload::FunctionSection( reader ) => for index in reader {
					functions.push( index? );
				},
				Payload::ExportSection( reader ) => for export in reader {
					let export = export?;
					let symbol = match export.kind {
						ExternalKind::Func => {
							let type_index = functions.get( export.index as usize )
								.copied()
								.ok_or( InterfaceError::UnknownFunction( export.index ))?;
							Symbol::Func( signature_at( &types, type_index )? )
						},
						ExternalKind::Table => Symbol::Table,
						ExternalKind::Memory => Symbol::Memory,
						ExternalKind::Global => Symbol::Global,
						ExternalKind::Tag => Symbol::Tag,
					};
					interface.exports.insert( export.name.to_string(), symbol );
				},
				_ => {},
			}
		}

		Ok( interface )

	}

}
