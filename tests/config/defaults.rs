use std::path::PathBuf ;
use wasm_ext_loader::{ ApiVersion, ExtensionContract, LoaderConfig };

#[test]
fn defaults_match_the_conventional_layout() {

	let config = LoaderConfig::default();
	assert_eq!( config.references, PathBuf::from( "Reference" ));
	assert_eq!( config.sources, PathBuf::from( "SourceCodes" ));
	assert_eq!( config.reference_extension, "wasm" );
	assert!( !config.warnings_as_errors );
	assert_eq!( config.fuel, None );
	assert_eq!( config.contract(), ExtensionContract::new( "host:extension", ApiVersion::new( 2, 1 )));
	assert!( !config.compiler_options().warnings_as_errors );

}

#[test]
fn empty_document_yields_defaults() {
	assert_eq!( LoaderConfig::from_toml( "" ).expect( "failed to parse empty config" ), LoaderConfig::default() );
}
