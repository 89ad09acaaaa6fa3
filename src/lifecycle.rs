//! Bringing discovered extensions up, one at a time.

use std::sync::Arc ;

use crate::extension::{ ExtensionDescriptor, ExtensionInstance };
use crate::startup::StartupError ;



/// Constructs and initializes `descriptors` one after another, in the order given.
///
/// Each extension gets its own store holding `host` and, when set, a `fuel` budget
/// for its constructor and another for its initializer.
///
/// # Errors
/// The first construction or initialization failure aborts the run; extensions
/// after it are never touched.
pub fn initialize_all<H: 'static>(
	descriptors: impl IntoIterator<Item = ExtensionDescriptor<H>>,
	host: &Arc<H>,
	fuel: Option<u64>,
) -> Result<Vec<ExtensionInstance<H>>, StartupError> {
	descriptors.into_iter()
		.map(| descriptor | -> Result<_, StartupError> {
			let mut extension = descriptor.instantiate( Arc::clone( host ), fuel )?;
			extension.initialize()?;
			let manifest = extension.manifest();
			tracing::info!( "Extension {} v{} (by {}) initialised", manifest.name(), manifest.version(), manifest.author() );
			Ok( extension )
		})
		.collect()
}
