use wasm_ext_loader::{ LoadError, ModuleError, ModuleOutcome };
use crate::fixture_tree::{ declare, FixtureTree, recording_loader, running, RECORD_IMPORT };

fn user_of_g() -> String {
	format!(
		"(import \"a\" \"g\" (func $g (result i32)))\n{}{}",
		RECORD_IMPORT,
		declare( &manifest!( "demo.User" ), "(call $record (call $g))" ),
	)
}

#[test]
fn library_importing_a_later_library_is_linked_after_it() {

	let tree = FixtureTree::new();
	tree.library( "b", r#"(module (func (export "f") (result i32) i32.const 7))"# );
	tree.library( "a", r#"(module
		(import "b" "f" (func $f (result i32)))
		(func (export "g") (result i32) call $f))"# );
	let source = user_of_g();
	tree.module( "Lib", &[( "user.wat", source.as_str() )]);

	let ( host, loader ) = recording_loader( &tree );
	let startup = loader.startup().expect( "startup failed" );

	assert_eq!( running( &startup ), vec![ "demo.User" ]);
	assert_eq!( host.records(), vec![( "demo.User".to_string(), 7 )]);

}

#[test]
fn library_with_unresolved_import_skips_only_modules_using_it() {

	let tree = FixtureTree::new();
	tree.library( "a", r#"(module
		(import "nowhere" "f" (func $f (result i32)))
		(func (export "g") (result i32) call $f))"# );
	let source = user_of_g();
	tree.module( "Lib", &[( "user.wat", source.as_str() )]);
	let fine = declare( &manifest!( "demo.Zed", "name": "Zed" ), "" );
	tree.module( "Zed", &[( "zed.wat", fine.as_str() )]);

	let ( _host, loader ) = recording_loader( &tree );
	let startup = loader.startup().expect( "startup failed" );

	match &startup.modules()[0].outcome {
		ModuleOutcome::Skipped( ModuleError::Load( LoadError::UnresolvedImport { importer, module, name })) => {
			assert_eq!(( importer.as_str(), module.as_str(), name.as_str() ), ( "a", "nowhere", "f" ));
		},
		other => panic!( "Expected Lib to be skipped with an unresolved import, got: {:#?}", other ),
	}
	assert_eq!( running( &startup ), vec![ "Zed" ]);

}

#[test]
fn libraries_importing_each_other_skip_the_module() {

	let tree = FixtureTree::new();
	tree.library( "a", r#"(module
		(import "b" "f" (func $f (result i32)))
		(func (export "g") (result i32) call $f))"# );
	tree.library( "b", r#"(module
		(import "a" "g" (func $g (result i32)))
		(func (export "f") (result i32) call $g))"# );
	let source = user_of_g();
	tree.module( "Lib", &[( "user.wat", source.as_str() )]);

	let ( _host, loader ) = recording_loader( &tree );
	let startup = loader.startup().expect( "startup failed" );

	match &startup.modules()[0].outcome {
		ModuleOutcome::Skipped( ModuleError::Load( LoadError::ReferenceCycle { names })) => {
			assert_eq!( names, &vec![ "a".to_string(), "b".to_string() ]);
		},
		other => panic!( "Expected Lib to be skipped with a reference cycle, got: {:#?}", other ),
	}
	assert!( startup.extensions().is_empty() );

}
