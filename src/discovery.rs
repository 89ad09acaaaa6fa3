//! Extension discovery.
//!
//! Discovery is a pure filter over the types a [`LoadedModule`] declares. Nothing is
//! instantiated here; the surviving types become [`ExtensionDescriptor`]s.

use std::sync::Arc ;
use thiserror::Error ;

use crate::extension::ExtensionDescriptor ;
use crate::loader::LoadedModule ;
use crate::manifest::{ ApiVersion, ExtensionManifest, Visibility };



/// The contract a type must implement to be picked up as an extension.
#[derive( Clone, Debug, PartialEq, Eq )]
pub struct ExtensionContract {
	name: String,
	api_version: ApiVersion,
}

impl ExtensionContract {

	/// Default contract name.
	pub const DEFAULT_NAME: &'static str = "host:extension" ;
	/// Default contract version.
	pub const DEFAULT_API_VERSION: ApiVersion = ApiVersion::new( 2, 1 );

	pub fn new( name: impl Into<String>, api_version: ApiVersion ) -> Self {
		Self { name: name.into(), api_version }
	}

	#[inline] pub fn name( &self ) -> &str { &self.name }

	#[inline] pub fn api_version( &self ) -> ApiVersion { self.api_version }

	/// Whether a type written against `marker` can run on this contract.
	///
	/// Majors must match and the type may not need a newer minor than the host offers.
	pub fn accepts_version( &self, marker: ApiVersion ) -> bool {
		marker.major == self.api_version.major && marker.minor <= self.api_version.minor
	}

}

impl Default for ExtensionContract {
	fn default() -> Self { Self::new( Self::DEFAULT_NAME, Self::DEFAULT_API_VERSION )}
}

/// Why a declared type was not discovered.
#[derive( Clone, Debug, PartialEq, Eq, Error )]
pub enum Exclusion {
	#[error( "type is not public" )] NotPublic,
	#[error( "type is abstract" )] Abstract,
	#[error( "type does not implement the extension contract (extends {found:?})" )] ContractMismatch { found: Option<String> },
	#[error( "type carries no api-version marker" )] MissingVersionMarker,
	#[error( "type targets unsupported api-version {found}" )] IncompatibleVersion { found: ApiVersion },
}

/// Checks a single declared type against `contract`.
///
/// # Errors
/// Returns the first rule the type breaks, checked in the order visibility,
/// abstractness, contract, version marker.
pub fn classify( manifest: &ExtensionManifest, contract: &ExtensionContract ) -> Result<(), Exclusion> {
	if manifest.visibility() != Visibility::Public { return Err( Exclusion::NotPublic ) }
	if manifest.is_abstract() { return Err( Exclusion::Abstract ) }
	if manifest.extends() != Some( contract.name() ) {
		return Err( Exclusion::ContractMismatch { found: manifest.extends().map( str::to_string ) });
	}
	match manifest.api_version() {
		None => Err( Exclusion::MissingVersionMarker ),
		Some( found ) if !contract.accepts_version( found ) => Err( Exclusion::IncompatibleVersion { found }),
		Some( _ ) => Ok(()),
	}
}

/// Collects every type of `module` that satisfies `contract`.
///
/// The result follows declaration order, which carries no meaning; use
/// [`order`]( crate::order ) before initializing.
pub fn discover<H>( module: &Arc<LoadedModule<H>>, contract: &ExtensionContract ) -> Vec<ExtensionDescriptor<H>> {
	module.types().iter()
		.filter_map(| manifest | match classify( manifest, contract ) {
			Ok(()) => Some( ExtensionDescriptor::new( Arc::clone( module ), manifest.clone() )),
			Err( exclusion ) => {
				tracing::debug!( module = module.name(), type_name = manifest.type_name(), "Skipping type: {}", exclusion );
				None
			},
		})
		.collect()
}
