use std::sync::Arc ;
use wasm_ext_loader::ExtensionStatus ;
use crate::fixture_tree::{ declare, recording_loader, FixtureTree };

#[test]
fn extension_moves_from_instantiated_to_initialized() {

	let tree = FixtureTree::new();
	let source = declare( &manifest!( "demo.Plain" ), "" );
	let dir = tree.module( "Plain", &[( "plain.wat", source.as_str() )]);

	let ( host, loader ) = recording_loader( &tree );
	let prepared = loader.load_module( &dir ).expect( "failed to load module" );
	let descriptor = prepared.extensions().first().expect( "no extension discovered" ).clone();

	let mut extension = descriptor.instantiate( Arc::clone( &host ), None ).expect( "failed to construct extension" );
	assert_eq!( extension.status(), ExtensionStatus::Instantiated );
	assert_eq!( extension.manifest().type_name(), "demo.Plain" );

	extension.initialize().expect( "failed to initialize extension" );
	assert_eq!( extension.status(), ExtensionStatus::Initialized );

}

#[test]
fn failed_initialization_leaves_extension_failed() {

	let tree = FixtureTree::new();
	let source = declare( &manifest!( "demo.Broken" ), "unreachable" );
	let dir = tree.module( "Broken", &[( "broken.wat", source.as_str() )]);

	let ( host, loader ) = recording_loader( &tree );
	let prepared = loader.load_module( &dir ).expect( "failed to load module" );
	let descriptor = prepared.extensions().first().expect( "no extension discovered" ).clone();

	let mut extension = descriptor.instantiate( host, None ).expect( "failed to construct extension" );
	match extension.initialize() {
		Err( err ) => assert_eq!( err.name, "demo.Broken" ),
		Ok(()) => panic!( "Expected the initializer to trap" ),
	}
	assert_eq!( extension.status(), ExtensionStatus::Failed );

}
