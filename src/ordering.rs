//! Initialization order of discovered extensions.

use std::cmp::Ordering ;
use itertools::Itertools ;

use crate::manifest::ExtensionManifest ;



/// Initialization order of two declared types.
///
/// Lower ordering hints come first; equal hints fall back to the declared name and
/// finally to the type name, which is unique within a module.
pub fn compare( a: &ExtensionManifest, b: &ExtensionManifest ) -> Ordering {
	a.order().cmp( &b.order() )
		.then_with(|| a.name().cmp( b.name() ))
		.then_with(|| a.type_name().cmp( b.type_name() ))
}

/// Sorts extensions into initialization order.
pub fn order<T: AsRef<ExtensionManifest>>( extensions: impl IntoIterator<Item = T> ) -> Vec<T> {
	extensions.into_iter()
		.sorted_by(| a, b | compare( a.as_ref(), b.as_ref() ))
		.collect()
}
