use wasm_ext_loader::{ ExtensionStatus, ModuleOutcome };
use crate::fixture_tree::{ declare, FixtureTree, recording_loader, running };

#[test]
fn single_public_extension_is_initialized() {

	let tree = FixtureTree::new();
	let source = declare( &manifest!( "demo.Foo", "name": "Foo", "version": "1.0", "order": 10 ), "" );
	tree.module( "A", &[( "foo.wat", source.as_str() )]);

	let ( _host, loader ) = recording_loader( &tree );
	let startup = loader.startup().expect( "startup failed" );

	assert_eq!( running( &startup ), vec![ "Foo" ]);
	let extension = &startup.extensions()[0];
	assert_eq!( extension.status(), ExtensionStatus::Initialized );
	assert_eq!( extension.manifest().version(), "1.0" );
	assert_eq!( extension.manifest().order(), 10 );

	match &startup.modules()[0].outcome {
		ModuleOutcome::Initialized { extensions, .. } => assert_eq!( extensions, &vec![ "Foo".to_string() ]),
		other => panic!( "Expected an initialized module, got: {:#?}", other ),
	}

}
