use wasm_ext_loader::{ CompilationResult, CompilerOptions, IMPORT_MISMATCH };
use crate::fixture_tree::compile ;

#[test]
fn import_with_wrong_signature_is_a_mismatch() {

	match compile( CompilerOptions::default(), &[( "imports.wat", "(import \"host\" \"log\" (func (param i32)))" )]) {
		CompilationResult::Failure( diagnostics ) => assert_eq!( diagnostics.first().id(), IMPORT_MISMATCH ),
		other => panic!( "Expected LNK0002, got: {:#?}", other ),
	}

}

#[test]
fn import_with_wrong_kind_is_a_mismatch() {

	match compile( CompilerOptions::default(), &[( "imports.wat", "(import \"host\" \"record\" (memory 1))" )]) {
		CompilationResult::Failure( diagnostics ) => assert_eq!( diagnostics.first().id(), IMPORT_MISMATCH ),
		other => panic!( "Expected LNK0002, got: {:#?}", other ),
	}

}

#[test]
fn matching_import_compiles() {

	match compile( CompilerOptions::default(), &[( "imports.wat", "(import \"host\" \"log\" (func (param i32 i32)))" )]) {
		CompilationResult::Success( image ) => assert_no_warnings!( image.warnings() ),
		other => panic!( "Expected success, got: {:#?}", other ),
	}

}
