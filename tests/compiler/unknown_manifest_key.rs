use wasm_ext_loader::{ CompilationResult, CompilerOptions, Severity, UNKNOWN_MANIFEST_KEY };
use crate::fixture_tree::{ compile, declare };

fn source() -> String {
	declare( &manifest!( "demo.Odd", "flavour": "vanilla" ), "" )
}

#[test]
fn unknown_key_is_only_a_warning() {

	let source = source();
	match compile( CompilerOptions::default(), &[( "types.wat", source.as_str() )]) {
		CompilationResult::Success( image ) => match image.warnings() {
			[ warning ] => {
				assert_eq!( warning.id(), UNKNOWN_MANIFEST_KEY );
				assert_eq!( warning.severity(), Severity::Warning );
				assert!( warning.message().contains( "flavour" ), "Unexpected message: {}", warning.message() );
			},
			other => panic!( "Expected one warning, got: {:#?}", other ),
		},
		CompilationResult::Failure( diagnostics ) => panic!( "Expected success, got: {:#?}", diagnostics ),
	}

}

#[test]
fn unknown_key_fails_when_warnings_are_errors() {

	let source = source();
	match compile( CompilerOptions { warnings_as_errors: true }, &[( "types.wat", source.as_str() )]) {
		CompilationResult::Failure( diagnostics ) => {
			let diagnostic = diagnostics.first();
			assert_eq!( diagnostic.id(), UNKNOWN_MANIFEST_KEY );
			assert_eq!( diagnostic.severity(), Severity::Error );
		},
		other => panic!( "Expected an escalated EXT0003, got: {:#?}", other ),
	}

}
