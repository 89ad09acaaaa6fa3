use wasm_ext_loader::StartupError ;
use crate::fixture_tree::{ declare, FixtureTree, recording_loader, RECORD_IMPORT };

#[test]
fn failing_initializer_aborts_startup() {

	let tree = FixtureTree::new();
	let failing = format!(
		"{}{}{}",
		RECORD_IMPORT,
		declare( &manifest!( "demo.Before", "order": 0 ), "(call $record (i32.const 1))" ),
		declare( &manifest!( "demo.Failing", "name": "Failing" ), "unreachable" ),
	);
	tree.module( "D", &[( "failing.wat", failing.as_str() )]);
	let later = format!( "{}{}", RECORD_IMPORT, declare( &manifest!( "demo.Later" ), "(call $record (i32.const 2))" ));
	tree.module( "E", &[( "later.wat", later.as_str() )]);

	let ( host, loader ) = recording_loader( &tree );
	match loader.startup() {
		Err( StartupError::Initialization( err )) => assert_eq!( err.name, "Failing" ),
		other => panic!( "Expected startup to abort, got: {:#?}", other ),
	}

	assert_eq!( host.records(), vec![( "demo.Before".to_string(), 1 )]);

}
