//! Loading binary images into the running process.
//!
//! [`ModuleLoader::load`] hands an image straight to wasmtime, which compiles it to
//! native code in memory. The resulting [`LoadedModule`] is shared by every
//! extension discovered from it and lives as long as any of them does; there is no
//! unload path.

use std::collections::{ BTreeMap, BTreeSet };
use std::sync::Arc ;
use pipe_trait::Pipe ;
use thiserror::Error ;
use wasmtime::{ Engine, Instance, Linker, Module, Store };

use crate::compiler::BinaryImage ;
use crate::host::{ ExtensionContext, HostError, HostLibrary };
use crate::manifest::{ read_manifests, ExtensionManifest, ManifestError };
use crate::reference::{ ImportEntry, ModuleInterface, Reference, ReferenceOrigin, Symbol };



/// Errors raised while loading an image.
///
/// The compiler is expected to catch all of these; seeing one means the compiler
/// and the loader disagree about what a valid image is.
#[derive( Debug, Error )]
pub enum LoadError {
	/// wasmtime rejected the image.
	#[error( "Module {module} is malformed: {cause}" )]
	Malformed { module: String, cause: wasmtime::Error },
	/// wasmtime rejected a library reference.
	#[error( "Reference {name} could not be loaded: {cause}" )]
	Reference { name: String, cause: wasmtime::Error },
	/// An import of the module or of one of its libraries names a symbol no
	/// reference provides.
	#[error( "Unresolved import {module}::{name} in {importer}" )]
	UnresolvedImport { importer: String, module: String, name: String },
	/// An import names a symbol of a different kind or signature.
	#[error( "Import {module}::{name} in {importer} expects {expected} but {found} is provided" )]
	ImportMismatch { importer: String, module: String, name: String, expected: Symbol, found: Symbol },
	/// Library references import each other, so none of them can be linked first.
	#[error( "Library references import each other in a cycle: {}", .names.join( ", " ))]
	ReferenceCycle { names: Vec<String> },
	/// The image's manifests couldn't be read.
	#[error( transparent )]
	Manifest( #[from] ManifestError ),
}

/// A module compiled into the process, together with the types it declares.
pub struct LoadedModule<H> {
	name: String,
	module: Module,
	libraries: Vec<( String, Module )>,
	linker: Linker<ExtensionContext<H>>,
	types: Vec<ExtensionManifest>,
}

impl<H> LoadedModule<H> {

	#[inline] pub fn name( &self ) -> &str { &self.name }

	/// The compiled wasmtime module.
	#[inline] pub fn module( &self ) -> &Module { &self.module }

	/// Every type the module declares, in declaration order.
	#[inline] pub fn types( &self ) -> &[ExtensionManifest] { &self.types }

}

impl<H: 'static> LoadedModule<H> {

	/// Instantiates a fresh copy of the module inside `store`.
	///
	/// The libraries the module needs are instantiated into the same store first,
	/// each after the libraries it imports from.
	pub(crate) fn instantiate( &self, store: &mut Store<ExtensionContext<H>> ) -> Result<Instance, wasmtime::Error> {
		let mut linker = self.linker.clone();
		for ( name, library ) in &self.libraries {
			linker.module( &mut *store, name, library )?;
		}
		linker.instantiate( &mut *store, &self.module )
	}

}

impl<H> std::fmt::Debug for LoadedModule<H> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "LoadedModule" )
			.field( "name", &self.name )
			.field( "module", &"<Module>" )
			.field( "libraries", &self.libraries.iter().map(|( name, _ )| name ).collect::<Vec<_>>() )
			.field( "types", &self.types )
			.finish_non_exhaustive()
	}
}

/// Loads binary images produced by the [`Compiler`]( crate::Compiler ).
pub struct ModuleLoader<H> {
	engine: Engine,
	linker: Linker<ExtensionContext<H>>,
}

impl<H: Send + Sync + 'static> ModuleLoader<H> {

	/// Creates a loader whose modules see the functions of `host_library`.
	///
	/// # Errors
	/// Fails if a host function can't be defined.
	pub fn new( engine: Engine, host_library: &HostLibrary<H> ) -> Result<Self, HostError> {
		let mut linker = Linker::new( &engine );
		host_library.define( &engine, &mut linker )?;
		Ok( Self { engine, linker })
	}

	#[inline] pub fn engine( &self ) -> &Engine { &self.engine }

	/// Compiles `image` and its library `references` into the engine.
	///
	/// # Errors
	/// Fails if wasmtime rejects the image or a library, an import of the image or
	/// of a library it needs can't be resolved, the needed libraries import each
	/// other in a cycle, or the manifests can't be read.
	pub fn load( &self, image: &BinaryImage, references: &[Reference] ) -> Result<Arc<LoadedModule<H>>, LoadError> {

		let module = Module::from_binary( &self.engine, image.bytes() )
			.map_err(| cause | LoadError::Malformed { module: image.module_name().to_string(), cause })?;

		let interface = ModuleInterface::inspect( image.bytes() )
			.map_err(| err | LoadError::Malformed { module: image.module_name().to_string(), cause: wasmtime::Error::new( err ) })?;
		check_imports( image.module_name(), &interface.imports, references )?;

		let libraries = required_libraries( &interface, references )?
			.pipe( link_order )?
			.into_iter()
			.map(|( name, bytes )| match Module::from_binary( &self.engine, bytes ) {
				Ok( library ) => Ok(( name, library )),
				Err( cause ) => Err( LoadError::Reference { name, cause }),
			})
			.collect::<Result<Vec<_>, _>>()?;

		let types = read_manifests( image.bytes() )?;

		tracing::debug!( module = image.module_name(), types = types.len(), "Loaded module" );
		Ok( Arc::new( LoadedModule {
			name: image.module_name().to_string(),
			module,
			libraries,
			linker: self.linker.clone(),
			types,
		}))

	}

}

/// A library reference the module needs, with the libraries it imports from.
struct RequiredLibrary<'a> {
	bytes: &'a [u8],
	depends: BTreeSet<String>,
}

fn library_bytes<'a>( references: &'a [Reference], name: &str ) -> Option<&'a [u8]> {
	references.iter()
		.find(| reference | reference.name() == name )
		.and_then(| reference | match reference.origin() {
			ReferenceOrigin::Library { bytes, .. } => Some( bytes.as_slice() ),
			ReferenceOrigin::Host => None,
		})
}

fn check_imports( importer: &str, imports: &[ImportEntry], references: &[Reference] ) -> Result<(), LoadError> {
	imports.iter().try_for_each(| import | {
		let provided = references.iter()
			.find(| reference | reference.name() == import.module )
			.and_then(| reference | reference.symbol( &import.name ))
			.ok_or_else(|| LoadError::UnresolvedImport {
				importer: importer.to_string(),
				module: import.module.clone(),
				name: import.name.clone(),
			})?;
		match import.symbol.accepts( provided ) {
			true => Ok(()),
			false => Err( LoadError::ImportMismatch {
				importer: importer.to_string(),
				module: import.module.clone(),
				name: import.name.clone(),
				expected: import.symbol.clone(),
				found: provided.clone(),
			}),
		}
	})
}

/// Collects the libraries `interface` imports from, directly or through other
/// libraries, checking each library's own imports on the way.
fn required_libraries<'a>(
	interface: &ModuleInterface,
	references: &'a [Reference],
) -> Result<BTreeMap<String, RequiredLibrary<'a>>, LoadError> {

	let library_imports = | imports: &[ImportEntry] | imports.iter()
		.filter(| import | library_bytes( references, &import.module ).is_some() )
		.map(| import | import.module.clone() )
		.collect::<BTreeSet<_>>();

	let mut required = BTreeMap::new();
	let mut pending = library_imports( &interface.imports ).into_iter().collect::<Vec<_>>();

	while let Some( name ) = pending.pop() {
		if required.contains_key( &name ) { continue }
		let Some( bytes ) = library_bytes( references, &name ) else { continue };
		let library = ModuleInterface::inspect( bytes )
			.map_err(| err | LoadError::Reference { name: name.clone(), cause: wasmtime::Error::new( err ) })?;
		check_imports( &name, &library.imports, references )?;
		let depends = library_imports( &library.imports );
		pending.extend( depends.iter().cloned() );
		required.insert( name, RequiredLibrary { bytes, depends });
	}

	Ok( required )

}

/// Orders libraries so each comes after every library it imports from.
fn link_order<'a>( mut pending: BTreeMap<String, RequiredLibrary<'a>> ) -> Result<Vec<( String, &'a [u8] )>, LoadError> {

	let mut linked: Vec<( String, &'a [u8] )> = Vec::new();

	while !pending.is_empty() {
		let ready = pending.iter()
			.filter(|( _, library )| library.depends.iter().all(| name | linked.iter().any(|( done, _ )| done == name )))
			.map(|( name, _ )| name.clone() )
			.collect::<Vec<_>>();
		if ready.is_empty() {
			return Err( LoadError::ReferenceCycle { names: pending.into_keys().collect() });
		}
		for name in ready {
			if let Some( library ) = pending.remove( &name ) { linked.push(( name, library.bytes )); }
		}
	}

	Ok( linked )

}

impl<H> std::fmt::Debug for ModuleLoader<H> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ModuleLoader" ).finish_non_exhaustive()
	}
}
