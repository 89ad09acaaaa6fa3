//! The host side of the extension contract.
//!
//! Every extension runs in its own wasmtime [`Store`]( wasmtime::Store ) whose data is
//! an [`ExtensionContext`]. The context carries the host context `H` the extension was
//! constructed with, so host functions can reach it through [`Caller::data`].
//!
//! The host's core functions are declared on a [`HostLibrary`]. The library is both
//! defined into every extension's linker and published as a [`Reference`], which
//! lets the compiler check imports of host functions before anything runs.

use std::collections::BTreeMap ;
use std::sync::Arc ;
use thiserror::Error ;
use wasmtime::{ Caller, Engine, Extern, FuncType, Linker, Val };

use crate::reference::{ Reference, ReferenceOrigin, Signature, Symbol, ValueKind };



/// Store data of a live extension.
pub struct ExtensionContext<H> {
	host: Arc<H>,
	type_name: String,
}

impl<H> ExtensionContext<H> {

	pub(crate) fn new( host: Arc<H>, type_name: impl Into<String> ) -> Self {
		Self { host, type_name: type_name.into() }
	}

	/// The host context this extension was constructed with.
	#[inline] pub fn host( &self ) -> &H { &self.host }

	/// A shared handle to the host context.
	#[inline] pub fn host_handle( &self ) -> &Arc<H> { &self.host }

	/// Fully qualified type name of the extension owning this store.
	#[inline] pub fn type_name( &self ) -> &str { &self.type_name }

}

impl<H> std::fmt::Debug for ExtensionContext<H> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ExtensionContext" )
			.field( "host", &"<host>" )
			.field( "type_name", &self.type_name )
			.finish()
	}
}

/// Errors raised by host functions or while defining them.
#[derive( Debug, Error )]
pub enum HostError {
	/// A host function was called with arguments that don't match its signature.
	#[error( "Invalid arguments passed to host function {0}" )] InvalidArguments( String ),
	/// The calling extension doesn't export a linear memory named `memory`.
	#[error( "Extension {0} does not export a memory" )] MissingMemory( String ),
	/// A pointer/length pair points outside the extension's memory.
	#[error( "Memory access out of bounds: {len} bytes at {ptr}" )] OutOfBounds { ptr: i32, len: i32 },
	/// A host function declares a value type wasmtime can't express.
	#[error( "Host function {0} uses an unsupported value type" )] UnsupportedType( String ),
	/// wasmtime refused a definition.
	#[error( "Failed to define host function {name}: {cause}" )] Define { name: String, cause: wasmtime::Error },
}

type HostCallback<H> = Arc<dyn Fn( Caller<'_, ExtensionContext<H>>, &[Val], &mut [Val] ) -> wasmtime::Result<()> + Send + Sync>;

struct HostFunction<H: 'static> {
	name: String,
	signature: Signature,
	callback: HostCallback<H>,
}

/// The host's core functions, importable by extensions under one module name.
///
/// ```
/// use wasm_ext_loader::{ HostLibrary, Val, ValueKind };
///
/// struct Server { motd: String }
///
/// let library = HostLibrary::<Server>::new( "host" )
/// 	.with_logging()
/// 	.func( "motd-length", [], [ ValueKind::I32 ], | caller, _params, results | {
/// 		let length = caller.data().host().motd.len();
/// 		results[0] = Val::I32( i32::try_from( length ).unwrap_or( i32::MAX ));
/// 		Ok(())
/// 	});
/// assert_eq!( library.name(), "host" );
/// ```
pub struct HostLibrary<H: 'static> {
	name: String,
	functions: Vec<HostFunction<H>>,
}

impl<H: 'static> HostLibrary<H> {

	/// Import module name of the library.
	#[inline] pub fn name( &self ) -> &str { &self.name }

	/// Names of the declared functions, in declaration order.
	pub fn functions( &self ) -> impl Iterator<Item = &str> {
		self.functions.iter().map(| function | function.name.as_str() )
	}

	/// The library as a compile-time reference.
	pub fn reference( &self ) -> Reference {
		let symbols = self.functions.iter()
			.map(| function | ( function.name.clone(), Symbol::Func( function.signature.clone() )))
			.collect::<BTreeMap<_, _>>();
		Reference::new( self.name.clone(), ReferenceOrigin::Host, symbols )
	}

}

impl<H: Send + Sync + 'static> HostLibrary<H> {

	/// Creates an empty library importable as `name`.
	pub fn new( name: impl Into<String> ) -> Self {
		Self { name: name.into(), functions: Vec::new() }
	}

	/// Declares a host function with an explicit signature.
	///
	/// Declaring a name twice replaces the earlier declaration.
	pub fn func(
		mut self,
		name: impl Into<String>,
		params: impl IntoIterator<Item = ValueKind>,
		results: impl IntoIterator<Item = ValueKind>,
		callback: impl Fn( Caller<'_, ExtensionContext<H>>, &[Val], &mut [Val] ) -> wasmtime::Result<()> + Send + Sync + 'static,
	) -> Self {
		let name = name.into();
		self.functions.retain(| function | function.name != name );
		self.functions.push( HostFunction {
			name,
			signature: Signature::new( params, results ),
			callback: Arc::new( callback ),
		});
		self
	}

	/// Adds `log(ptr: i32, len: i32)`, which logs a UTF-8 string read from the
	/// calling extension's exported `memory`.
	pub fn with_logging( self ) -> Self {
		self.func( "log", [ ValueKind::I32, ValueKind::I32 ], [], | mut caller, params, _results | {

			let ( Some( Val::I32( ptr )), Some( Val::I32( len ))) = ( params.first(), params.get( 1 )) else {
				return Err( wasmtime::Error::new( HostError::InvalidArguments( "log".to_string() )));
			};
			let ( ptr, len ) = ( *ptr, *len );

			let Some( Extern::Memory( memory )) = caller.get_export( "memory" ) else {
				return Err( wasmtime::Error::new( HostError::MissingMemory( caller.data().type_name().to_string() )));
			};

			let out_of_bounds = || wasmtime::Error::new( HostError::OutOfBounds { ptr, len });
			let start = usize::try_from( ptr ).map_err(|_| out_of_bounds() )?;
			let end = usize::try_from( len ).ok()
				.and_then(| len | start.checked_add( len ))
				.ok_or_else( out_of_bounds )?;
			let bytes = memory.data( &caller ).get( start..end ).ok_or_else( out_of_bounds )?;

			let message = String::from_utf8_lossy( bytes ).into_owned();
			tracing::info!( extension = caller.data().type_name(), "{}", message );
			Ok(())

		})
	}

	/// Defines every function into `linker`.
	pub(crate) fn define( &self, engine: &Engine, linker: &mut Linker<ExtensionContext<H>> ) -> Result<(), HostError> {
		self.functions.iter().try_for_each(| function | {

			let unsupported = || HostError::UnsupportedType( function.name.clone() );
			let params = function.signature.params().iter()
				.map(| kind | kind.to_val_type().ok_or_else( unsupported ))
				.collect::<Result<Vec<_>, _>>()?;
			let results = function.signature.results().iter()
				.map(| kind | kind.to_val_type().ok_or_else( unsupported ))
				.collect::<Result<Vec<_>, _>>()?;

			let callback = Arc::clone( &function.callback );
			linker
				.func_new(
					&self.name,
					&function.name,
					FuncType::new( engine, params, results ),
					move | caller, params, results | callback( caller, params, results ),
				)
				.map_err(| cause | HostError::Define { name: function.name.clone(), cause })?;
			Ok(())

		})
	}

}
