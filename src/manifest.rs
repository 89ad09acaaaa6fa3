//! Extension type manifests.
//!
//! A compiled module declares its types through JSON records stored in custom
//! sections named [`EXTENSION_SECTION`]. In source form a declaration looks like:
//!
//! ```text
//! (@custom "extension" "{\"type\":\"demo.Greeter\",\"extends\":\"host:extension\",\"visibility\":\"public\",\"api-version\":[2,1],\"name\":\"Greeter\",\"version\":\"1.0\",\"author\":\"Leader\",\"order\":10}")
//! ```
//!
//! A type named `T` is backed by the exported functions `T#new` (constructor) and
//! `T#initialize` (initialization entry point).

use std::collections::BTreeMap ;
use serde::Deserialize ;
use thiserror::Error ;
use wasmparser::{ Parser, Payload };



/// Name of the custom sections holding manifests.
pub const EXTENSION_SECTION: &str = "extension" ;

/// Errors raised while reading manifests out of a binary image.
#[derive( Debug, Error )]
pub enum ManifestError {
	/// The image couldn't be parsed far enough to reach its custom sections.
	#[error( "Failed to read custom sections: {0}" )] Reader( #[from] wasmparser::BinaryReaderError ),
	/// A manifest isn't valid JSON or has the wrong shape.
	#[error( "Malformed manifest: {0}" )] Malformed( #[from] serde_json::Error ),
}

/// Whether a type may be discovered from outside its module.
#[derive( Copy, Clone, Debug, PartialEq, Eq, Default, Deserialize )]
#[serde( rename_all = "kebab-case" )]
pub enum Visibility {
	Public,
	#[default] Internal,
}

/// Version of the extension contract a type was written against.
#[derive( Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize )]
#[serde( from = "[u32; 2]" )]
pub struct ApiVersion {
	pub major: u32,
	pub minor: u32,
}

impl ApiVersion {
	pub const fn new( major: u32, minor: u32 ) -> Self { Self { major, minor }}
}

impl From<[u32; 2]> for ApiVersion {
	fn from([ major, minor ]: [u32; 2] ) -> Self { Self { major, minor }}
}

impl std::fmt::Display for ApiVersion {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		write!( f, "{}.{}", self.major, self.minor )
	}
}

fn default_version() -> String { "0.0.0".to_string() }
fn default_order() -> i32 { 1 }

/// Declaration of one type inside a compiled module.
#[derive( Clone, Debug, PartialEq, Deserialize )]
#[serde( rename_all = "kebab-case" )]
pub struct ExtensionManifest {
	/// Fully qualified type name; also the prefix of the type's exports
	#[serde( rename = "type" )]
	type_name: String,
	/// Name of the contract the type implements
	#[serde( default )]
	extends: Option<String>,
	#[serde( default )]
	visibility: Visibility,
	#[serde( default, rename = "abstract" )]
	is_abstract: bool,
	/// Version marker; types without one are never discovered
	#[serde( default )]
	api_version: Option<ApiVersion>,
	#[serde( default )]
	name: Option<String>,
	#[serde( default = "default_version" )]
	version: String,
	#[serde( default )]
	author: String,
	#[serde( default )]
	description: Option<String>,
	/// Initialization ordering hint, lower runs first
	#[serde( default = "default_order" )]
	order: i32,
	#[serde( flatten )]
	unknown: BTreeMap<String, serde_json::Value>,
}

impl ExtensionManifest {

	/// Parses a single manifest record.
	///
	/// # Errors
	/// Fails if `data` isn't a JSON object of the expected shape.
	pub fn parse( data: &[u8] ) -> Result<Self, serde_json::Error> {
		serde_json::from_slice( data )
	}

	/// Fully qualified type name.
	#[inline] pub fn type_name( &self ) -> &str { &self.type_name }

	/// Contract the type declares to implement.
	#[inline] pub fn extends( &self ) -> Option<&str> { self.extends.as_deref() }

	#[inline] pub fn visibility( &self ) -> Visibility { self.visibility }

	#[inline] pub fn is_abstract( &self ) -> bool { self.is_abstract }

	#[inline] pub fn api_version( &self ) -> Option<ApiVersion> { self.api_version }

	/// Declared display name, falling back to the type name.
	#[inline] pub fn name( &self ) -> &str { self.name.as_deref().unwrap_or( &self.type_name ) }

	#[inline] pub fn version( &self ) -> &str { &self.version }

	#[inline] pub fn author( &self ) -> &str { &self.author }

	#[inline] pub fn description( &self ) -> Option<&str> { self.description.as_deref() }

	#[inline] pub fn order( &self ) -> i32 { self.order }

	/// Keys present in the record that no field above accounts for.
	pub fn unknown_keys( &self ) -> impl Iterator<Item = &str> {
		self.unknown.keys().map( String::as_str )
	}

	/// Export name of the constructor.
	pub fn constructor_export( &self ) -> String { format!( "{}#new", self.type_name ) }

	/// Export name of the initialization entry point.
	pub fn initializer_export( &self ) -> String { format!( "{}#initialize", self.type_name ) }

}

impl AsRef<ExtensionManifest> for ExtensionManifest {
	fn as_ref( &self ) -> &ExtensionManifest { self }
}

/// Raw payloads of every [`EXTENSION_SECTION`] in `bytes`, in section order.
pub(crate) fn manifest_sections( bytes: &[u8] ) -> Result<Vec<&[u8]>, wasmparser::BinaryReaderError> {
	let mut sections = Vec::new();
	for payload in Parser::new( 0 ).parse_all( bytes ) {
		if let Payload::CustomSection( reader ) = payload? {
			if reader.name() == EXTENSION_SECTION { sections.push( reader.data() ); }
		}
	}
	Ok( sections )
}

/// Every manifest declared by a binary image.
///
/// # Errors
/// Fails on the first section that can't be read or parsed.
pub fn read_manifests( bytes: &[u8] ) -> Result<Vec<ExtensionManifest>, ManifestError> {
	manifest_sections( bytes )?
		.into_iter()
		.map(| data | Ok( ExtensionManifest::parse( data )? ))
		.collect()
}
