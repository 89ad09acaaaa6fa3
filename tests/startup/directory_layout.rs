use crate::fixture_tree::{ FixtureTree, recording_loader_with };

#[test]
fn missing_roots_are_created() {

	let tree = FixtureTree::new();
	assert!( !tree.sources().exists() );
	assert!( !tree.references().exists() );

	let ( _host, loader ) = recording_loader_with( tree.config() );
	let startup = loader.startup().expect( "startup failed" );

	assert!( tree.sources().is_dir() );
	assert!( tree.references().is_dir() );
	assert!( startup.modules().is_empty() );

	loader.startup().expect( "second startup failed" );

}

#[test]
fn loose_files_in_the_sources_root_are_ignored() {

	let tree = FixtureTree::new();
	std::fs::create_dir_all( tree.sources() ).expect( "failed to create sources root" );
	std::fs::write( tree.sources().join( "README.txt" ), "not a module" ).expect( "failed to write stray file" );

	let ( _host, loader ) = recording_loader_with( tree.config() );
	let startup = loader.startup().expect( "startup failed" );
	assert!( startup.modules().is_empty() );

}
