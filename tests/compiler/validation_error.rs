use wasm_ext_loader::{ CompilationResult, CompilerOptions, Location, VALIDATION_ERROR };
use crate::fixture_tree::compile ;

#[test]
fn invalid_function_body_fails_validation() {

	match compile( CompilerOptions::default(), &[( "invalid.wat", "(func (export \"answer\") (result i32))" )]) {
		CompilationResult::Failure( diagnostics ) => {
			let diagnostic = diagnostics.first();
			assert_eq!( diagnostic.id(), VALIDATION_ERROR );
			assert!( matches!( diagnostic.location(), Location::Binary { .. }), "Expected a binary offset, got: {:#?}", diagnostic.location() );
		},
		other => panic!( "Expected a validation error, got: {:#?}", other ),
	}

}
