use wasm_ext_loader::{ classify, Exclusion, ExtensionContract, ExtensionManifest };
use crate::fixture_tree::without ;

#[test]
fn internal_type_is_excluded() {

	let manifest = ExtensionManifest::parse( manifest!( "demo.Hidden", "visibility": "internal" ).to_string().as_bytes() )
		.expect( "failed to parse manifest" );
	assert_eq!( classify( &manifest, &ExtensionContract::default() ), Err( Exclusion::NotPublic ));

}

#[test]
fn type_without_visibility_defaults_to_internal() {

	let manifest = ExtensionManifest::parse( without( manifest!( "demo.Hidden" ), "visibility" ).to_string().as_bytes() )
		.expect( "failed to parse manifest" );
	assert_eq!( classify( &manifest, &ExtensionContract::default() ), Err( Exclusion::NotPublic ));

}
