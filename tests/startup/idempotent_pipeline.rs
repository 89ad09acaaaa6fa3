use wasm_ext_loader::{ CompilationResult, CompilationUnit, Compiler, CompilerOptions, resolve_references };
use crate::fixture_tree::{ declare, FixtureTree, recording_library, recording_loader, running };

#[test]
fn unchanged_tree_yields_identical_images_and_order() {

	let tree = FixtureTree::new();
	let source = [
		declare( &manifest!( "demo.Gamma", "name": "Gamma", "order": 2 ), "" ),
		declare( &manifest!( "demo.Alpha", "name": "Alpha", "order": 2 ), "" ),
		declare( &manifest!( "demo.Beta", "name": "Beta", "order": 1 ), "" ),
	].concat();
	let dir = tree.module( "Stable", &[( "types.wat", source.as_str() )]);

	let ( _host, loader ) = recording_loader( &tree );
	let library = recording_library();

	let image = || {
		let unit = CompilationUnit::aggregate( &dir ).expect( "failed to aggregate sources" );
		let references = resolve_references( &tree.references(), "wasm", &library ).expect( "failed to resolve references" );
		match Compiler::new( CompilerOptions::default() ).compile( &unit, &references ) {
			CompilationResult::Success( image ) => image,
			CompilationResult::Failure( diagnostics ) => panic!( "Expected success, got: {:#?}", diagnostics ),
		}
	};
	assert_eq!( image().bytes(), image().bytes() );

	let first = running( &loader.startup().expect( "first startup failed" ));
	let second = running( &loader.startup().expect( "second startup failed" ));
	assert_eq!( first, vec![ "Beta", "Alpha", "Gamma" ]);
	assert_eq!( first, second );

}
