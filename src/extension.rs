//! Extensions and their lifecycle.
//!
//! An extension moves through the states
//!
//! - **Discovered**: an [`ExtensionDescriptor`], a declared type that passed discovery.
//! - **Instantiated**: an [`ExtensionInstance`] whose constructor ran.
//! - **Initialized**: the instance's initialization entry point returned.
//!
//! A constructor that traps never produces an instance; it surfaces as a
//! [`ConstructionError`] instead. A failing initialization leaves the instance in
//! [`ExtensionStatus::Failed`].

use std::sync::Arc ;
use thiserror::Error ;
use wasmtime::{ Instance, Store, TypedFunc };

use crate::host::ExtensionContext ;
use crate::loader::LoadedModule ;
use crate::manifest::ExtensionManifest ;



/// The constructor of a discovered type failed.
#[derive( Debug, Error )]
#[error( "Failed to construct {type_name} from module {module}: {cause}" )]
pub struct ConstructionError {
	pub type_name: String,
	pub module: String,
	pub cause: wasmtime::Error,
}

/// The initialization entry point of an extension failed.
#[derive( Debug, Error )]
#[error( "Extension {name} failed to initialize: {cause}" )]
pub struct InitializationError {
	pub name: String,
	pub cause: wasmtime::Error,
}

/// A type that passed discovery, not yet instantiated.
pub struct ExtensionDescriptor<H> {
	module: Arc<LoadedModule<H>>,
	manifest: ExtensionManifest,
}

impl<H> ExtensionDescriptor<H> {

	pub(crate) fn new( module: Arc<LoadedModule<H>>, manifest: ExtensionManifest ) -> Self {
		Self { module, manifest }
	}

	/// The module declaring the type.
	#[inline] pub fn module( &self ) -> &Arc<LoadedModule<H>> { &self.module }

	#[inline] pub fn manifest( &self ) -> &ExtensionManifest { &self.manifest }

}

impl<H: 'static> ExtensionDescriptor<H> {

	/// Runs the type's constructor in a fresh store holding `host`.
	///
	/// When `fuel` is set, the constructor may burn at most that much; the engine
	/// must then have fuel consumption enabled.
	///
	/// # Errors
	/// Fails if the module can't be instantiated, either export is missing or has
	/// the wrong signature, or the constructor traps.
	pub fn instantiate( self, host: Arc<H>, fuel: Option<u64> ) -> Result<ExtensionInstance<H>, ConstructionError> {

		let fail = | cause: wasmtime::Error | ConstructionError {
			type_name: self.manifest.type_name().to_string(),
			module: self.module.name().to_string(),
			cause,
		};

		let context = ExtensionContext::new( host, self.manifest.type_name() );
		let mut store = Store::new( self.module.module().engine(), context );
		if let Some( fuel ) = fuel { store.set_fuel( fuel ).map_err( fail )?; }

		let instance = self.module.instantiate( &mut store ).map_err( fail )?;
		let constructor = instance
			.get_typed_func::<(), ()>( &mut store, &self.manifest.constructor_export() )
			.map_err( fail )?;
		let initializer = instance
			.get_typed_func::<(), ()>( &mut store, &self.manifest.initializer_export() )
			.map_err( fail )?;

		constructor.call( &mut store, () ).map_err( fail )?;

		tracing::trace!( type_name = self.manifest.type_name(), "Constructed extension" );
		Ok( ExtensionInstance {
			descriptor: self,
			store,
			instance,
			initializer,
			fuel,
			status: ExtensionStatus::Instantiated,
		})

	}

}

impl<H> AsRef<ExtensionManifest> for ExtensionDescriptor<H> {
	fn as_ref( &self ) -> &ExtensionManifest { &self.manifest }
}

impl<H> Clone for ExtensionDescriptor<H> {
	fn clone( &self ) -> Self {
		Self { module: Arc::clone( &self.module ), manifest: self.manifest.clone() }
	}
}

impl<H> std::fmt::Debug for ExtensionDescriptor<H> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ExtensionDescriptor" )
			.field( "module", &self.module.name() )
			.field( "manifest", &self.manifest )
			.finish()
	}
}

/// Where a constructed extension is in its lifecycle.
#[derive( Copy, Clone, Debug, PartialEq, Eq )]
pub enum ExtensionStatus {
	Instantiated,
	Initialized,
	Failed,
}

/// A constructed extension with its own store.
pub struct ExtensionInstance<H: 'static> {
	descriptor: ExtensionDescriptor<H>,
	store: Store<ExtensionContext<H>>,
	instance: Instance,
	initializer: TypedFunc<(), ()>,
	fuel: Option<u64>,
	status: ExtensionStatus,
}

impl<H: 'static> ExtensionInstance<H> {

	#[inline] pub fn manifest( &self ) -> &ExtensionManifest { self.descriptor.manifest() }

	#[inline] pub fn descriptor( &self ) -> &ExtensionDescriptor<H> { &self.descriptor }

	#[inline] pub fn status( &self ) -> ExtensionStatus { self.status }

	/// The host context the extension was constructed with.
	#[inline] pub fn host( &self ) -> &H { self.store.data().host() }

	/// The wasmtime instance backing the extension.
	#[inline] pub fn instance( &self ) -> Instance { self.instance }

	/// The store backing the extension, for calling further exports.
	#[inline] pub fn store_mut( &mut self ) -> &mut Store<ExtensionContext<H>> { &mut self.store }

	/// Runs the initialization entry point.
	///
	/// The fuel budget is refilled first, so construction and initialization each
	/// get the full amount.
	///
	/// # Errors
	/// Fails if the entry point traps or runs out of fuel. The extension is then
	/// left in [`ExtensionStatus::Failed`].
	pub fn initialize( &mut self ) -> Result<(), InitializationError> {

		let result = match self.fuel {
			Some( fuel ) => self.store.set_fuel( fuel ),
			None => Ok(()),
		}.and_then(|()| self.initializer.call( &mut self.store, () ));

		match result {
			Ok(()) => {
				self.status = ExtensionStatus::Initialized ;
				Ok(())
			},
			Err( cause ) => {
				self.status = ExtensionStatus::Failed ;
				Err( InitializationError { name: self.manifest().name().to_string(), cause })
			},
		}

	}

}

impl<H: 'static> AsRef<ExtensionManifest> for ExtensionInstance<H> {
	fn as_ref( &self ) -> &ExtensionManifest { self.manifest() }
}

impl<H: 'static> std::fmt::Debug for ExtensionInstance<H> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ExtensionInstance" )
			.field( "descriptor", &self.descriptor )
			.field( "status", &self.status )
			.field( "fuel", &self.fuel )
			.finish_non_exhaustive()
	}
}
