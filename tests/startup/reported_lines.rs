use wasm_ext_loader::{ ModuleError, ModuleOutcome };
use crate::fixture_tree::{ capture_logs, declare, FixtureTree, recording_loader };

#[test]
fn initialized_extension_is_announced() {

	let tree = FixtureTree::new();
	let source = declare( &manifest!( "demo.Foo", "name": "Foo", "version": "1.0", "author": "Ann" ), "" );
	tree.module( "A", &[( "foo.wat", source.as_str() )]);

	let ( _host, loader ) = recording_loader( &tree );
	let ( result, logs ) = capture_logs(|| loader.startup() );
	result.expect( "startup failed" );

	let announcements = logs.lines().filter(| line | line.contains( "initialised" )).collect::<Vec<_>>();
	assert_eq!( announcements.len(), 1, "Unexpected logs:\n{}", logs );
	assert!( announcements[0].contains( "INFO" ), "Unexpected line: {}", announcements[0] );
	assert!( announcements[0].contains( "Extension Foo v1.0 (by Ann) initialised" ), "Unexpected line: {}", announcements[0] );

}

#[test]
fn every_diagnostic_of_a_skipped_module_is_logged() {

	let tree = FixtureTree::new();
	tree.module( "C", &[( "broken.wat", "(func (export \"oops\")\n  i32.bogus\n)\n" )]);

	let ( _host, loader ) = recording_loader( &tree );
	let ( result, logs ) = capture_logs(|| loader.startup() );
	let startup = result.expect( "startup failed" );

	let diagnostics = match &startup.modules()[0].outcome {
		ModuleOutcome::Skipped( ModuleError::Compile { diagnostics, .. }) => diagnostics,
		other => panic!( "Expected C to be skipped with a compile error, got: {:#?}", other ),
	};

	for diagnostic in diagnostics.iter() {
		let rendered = diagnostic.to_string();
		assert!( rendered.starts_with( "WAT0001: " ), "Unexpected rendering: {}", rendered );
		assert!(
			logs.lines().any(| line | line.contains( "ERROR" ) && line.contains( &rendered )),
			"Missing error line for {}:\n{}", rendered, logs,
		);
	}
	assert!( !logs.contains( "initialised" ), "Unexpected logs:\n{}", logs );

}
