use std::path::PathBuf ;
use std::process::ExitCode ;
use std::sync::Arc ;
use std::time::Instant ;
use clap::Parser ;
use tracing_subscriber::EnvFilter ;

use wasm_ext_loader::{ ExtensionLoader, HostLibrary, LoaderConfig, Val, ValueKind };



/// Compile the extension sources and bring the extensions up.
#[derive( Parser, Debug )]
#[command( name = "wasm-ext-loader", version, about, long_about = None )]
struct Args {
	/// TOML config file
	#[arg( short, long )]
	config: Option<PathBuf>,
	/// Directory holding library references
	#[arg( long )]
	references: Option<PathBuf>,
	/// Directory holding one source directory per module
	#[arg( long )]
	sources: Option<PathBuf>,
	/// Fail compilation on warnings
	#[arg( long )]
	warnings_as_errors: bool,
	/// Fuel budget for each constructor and initializer call
	#[arg( long )]
	fuel: Option<u64>,
	/// Log at debug level
	#[arg( short, long )]
	verbose: bool,
}

/// The context extensions of this binary are constructed with.
struct Host { started: Instant }

fn host_library() -> HostLibrary<Host> {
	HostLibrary::<Host>::new( "host" )
		.with_logging()
		.func( "uptime-ms", [], [ ValueKind::I64 ], | caller, _params, results | {
			let elapsed = caller.data().host().started.elapsed().as_millis();
			results[0] = Val::I64( i64::try_from( elapsed ).unwrap_or( i64::MAX ));
			Ok(())
		})
}

fn main() -> ExitCode {

	let args = Args::parse();

	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new( match args.verbose { true => "debug", false => "info" }));
	tracing_subscriber::fmt()
		.with_env_filter( filter )
		.with_writer( std::io::stderr )
		.init();

	let mut config = match &args.config {
		Some( path ) => match LoaderConfig::from_file( path ) {
			Ok( config ) => config,
			Err( err ) => {
				tracing::error!( "{}", err );
				return ExitCode::FAILURE
			},
		},
		None => LoaderConfig::default(),
	};
	if let Some( references ) = args.references { config.references = references ; }
	if let Some( sources ) = args.sources { config.sources = sources ; }
	if args.warnings_as_errors { config.warnings_as_errors = true ; }
	if args.fuel.is_some() { config.fuel = args.fuel ; }

	let result = ExtensionLoader::new( config, Arc::new( Host { started: Instant::now() }), host_library() )
		.and_then(| loader | loader.startup() );

	match result {
		Ok( startup ) => {
			tracing::info!( "Startup complete, {} extension(s) running", startup.extensions().len() );
			ExitCode::SUCCESS
		},
		Err( err ) => {
			tracing::error!( "Startup aborted: {}", err );
			ExitCode::FAILURE
		},
	}

}
