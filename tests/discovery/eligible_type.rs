use wasm_ext_loader::{ classify, ExtensionContract, ExtensionManifest };

#[test]
fn eligible_type_is_discovered() {

	let manifest = ExtensionManifest::parse( manifest!( "demo.Eligible" ).to_string().as_bytes() )
		.expect( "failed to parse manifest" );

	assert_eq!( classify( &manifest, &ExtensionContract::default() ), Ok(()) );
	assert_eq!( manifest.name(), "demo.Eligible" );
	assert_eq!( manifest.order(), 1 );

}
