use wasm_ext_loader::{ ModuleError, ModuleOutcome, SYNTAX_ERROR };
use crate::fixture_tree::{ declare, FixtureTree, recording_loader, running };

#[test]
fn module_with_syntax_error_is_skipped_and_startup_continues() {

	let tree = FixtureTree::new();
	tree.module( "C", &[( "broken.wat", "(func (export \"oops\")\n  i32.bogus\n)\n" )]);
	let source = declare( &manifest!( "demo.Survivor", "name": "Survivor" ), "" );
	tree.module( "D", &[( "fine.wat", source.as_str() )]);

	let ( _host, loader ) = recording_loader( &tree );
	let startup = loader.startup().expect( "startup failed" );

	assert_eq!( running( &startup ), vec![ "Survivor" ]);
	match &startup.modules()[0].outcome {
		ModuleOutcome::Skipped( ModuleError::Compile { module, diagnostics }) => {
			assert_eq!( module, "C" );
			assert_eq!( diagnostics.first().id(), SYNTAX_ERROR );
		},
		other => panic!( "Expected C to be skipped with a compile error, got: {:#?}", other ),
	}

}

#[test]
fn module_with_unreadable_source_is_skipped() {

	let tree = FixtureTree::new();
	let dir = tree.module( "Binary", &[] );
	std::fs::write( dir.join( "blob.wat" ), [ 0xff, 0xfe, 0x00 ]).expect( "failed to write blob" );

	let ( _host, loader ) = recording_loader( &tree );
	let startup = loader.startup().expect( "startup failed" );

	match &startup.modules()[0].outcome {
		ModuleOutcome::Skipped( ModuleError::Source( _ )) => {}
		other => panic!( "Expected a source error, got: {:#?}", other ),
	}

}

#[test]
fn duplicate_reference_names_skip_the_module() {

	let tree = FixtureTree::new();
	tree.library( "host", "(module)" );
	tree.module( "Shadowed", &[] );

	let ( _host, loader ) = recording_loader( &tree );
	let startup = loader.startup().expect( "startup failed" );

	match &startup.modules()[0].outcome {
		ModuleOutcome::Skipped( ModuleError::Reference( _ )) => {}
		other => panic!( "Expected a reference error, got: {:#?}", other ),
	}

}
