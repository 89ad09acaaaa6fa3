use wasm_ext_loader::{ CompilationResult, CompilerOptions };
use crate::fixture_tree::{ compile, declare, RECORD_IMPORT };

#[test]
fn compiling_twice_yields_identical_bytes() {

	let source = format!(
		"{}{}{}",
		RECORD_IMPORT,
		declare( &manifest!( "demo.First", "order": 2 ), "(call $record (i32.const 1))" ),
		declare( &manifest!( "demo.Second" ), "(call $record (i32.const 2))" ),
	);

	let image = | | match compile( CompilerOptions::default(), &[( "types.wat", source.as_str() )]) {
		CompilationResult::Success( image ) => image,
		CompilationResult::Failure( diagnostics ) => panic!( "Expected success, got: {:#?}", diagnostics ),
	};

	let ( first, second ) = ( image(), image() );
	assert_eq!( first.bytes(), second.bytes() );
	assert_eq!( first, second );

}
