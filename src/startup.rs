//! The startup pipeline.
//!
//! [`ExtensionLoader::startup`] walks the subdirectories of the sources root in name
//! order. Each one is compiled into a module, loaded, searched for extensions and the
//! extensions found are brought up in order. A module that fails to compile or load
//! is reported and skipped. An extension that fails to construct or initialize stops
//! the whole startup.

use std::path::{ Path, PathBuf };
use std::sync::Arc ;
use nonempty_collections::NEVec ;
use pipe_trait::Pipe ;
use thiserror::Error ;
use wasmtime::Engine ;

use crate::compiler::{ CompilationResult, Compiler };
use crate::config::LoaderConfig ;
use crate::diagnostic::Diagnostic ;
use crate::discovery::{ discover, ExtensionContract };
use crate::extension::{ ConstructionError, ExtensionDescriptor, ExtensionInstance, InitializationError };
use crate::host::{ HostError, HostLibrary };
use crate::lifecycle::initialize_all ;
use crate::loader::{ LoadError, LoadedModule, ModuleLoader };
use crate::ordering::order ;
use crate::reference::{ resolve_references, ReferenceError };
use crate::source::{ CompilationUnit, SourceError };



/// A problem confined to one module. The module is skipped, startup goes on.
#[derive( Debug, Error )]
pub enum ModuleError {
	#[error( transparent )] Source( #[from] SourceError ),
	#[error( transparent )] Reference( #[from] ReferenceError ),
	#[error( "Module {module} failed to compile with {} error(s)", .diagnostics.len() )]
	Compile { module: String, diagnostics: NEVec<Diagnostic> },
	#[error( transparent )] Load( #[from] LoadError ),
}

/// A problem that stops startup.
#[derive( Debug, Error )]
pub enum StartupError {
	/// A root directory couldn't be created or listed.
	#[error( "Failed to prepare directory {}: {source}", .path.display() )]
	Layout { path: PathBuf, source: std::io::Error },
	#[error( "Failed to create the engine: {0}" )] Engine( wasmtime::Error ),
	#[error( transparent )] Host( #[from] HostError ),
	#[error( transparent )] Construction( #[from] ConstructionError ),
	#[error( transparent )] Initialization( #[from] InitializationError ),
}

/// What happened to one source directory.
#[derive( Debug )]
pub enum ModuleOutcome {
	/// Every extension of the module came up. Holds their names in
	/// initialization order and the compiler's warnings.
	Initialized { extensions: Vec<String>, warnings: Vec<Diagnostic> },
	Skipped( ModuleError ),
}

#[derive( Debug )]
pub struct ModuleReport {
	pub name: String,
	pub path: PathBuf,
	pub outcome: ModuleOutcome,
}

/// A compiled and loaded module with its extensions in initialization order.
pub struct PreparedModule<H> {
	module: Arc<LoadedModule<H>>,
	warnings: Vec<Diagnostic>,
	extensions: Vec<ExtensionDescriptor<H>>,
}

impl<H> PreparedModule<H> {

	#[inline] pub fn module( &self ) -> &Arc<LoadedModule<H>> { &self.module }

	#[inline] pub fn warnings( &self ) -> &[Diagnostic] { &self.warnings }

	#[inline] pub fn extensions( &self ) -> &[ExtensionDescriptor<H>] { &self.extensions }

}

impl<H> std::fmt::Debug for PreparedModule<H> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "PreparedModule" )
			.field( "module", &self.module )
			.field( "warnings", &self.warnings )
			.field( "extensions", &self.extensions )
			.finish()
	}
}

/// Result of a successful startup.
pub struct Startup<H: 'static> {
	modules: Vec<ModuleReport>,
	extensions: Vec<ExtensionInstance<H>>,
}

impl<H: 'static> Startup<H> {

	/// One report per source directory, in processing order.
	#[inline] pub fn modules( &self ) -> &[ModuleReport] { &self.modules }

	/// Live extensions in initialization order.
	#[inline] pub fn extensions( &self ) -> &[ExtensionInstance<H>] { &self.extensions }

	#[inline] pub fn extensions_mut( &mut self ) -> &mut [ExtensionInstance<H>] { &mut self.extensions }

	pub fn into_extensions( self ) -> Vec<ExtensionInstance<H>> { self.extensions }

}

impl<H: 'static> std::fmt::Debug for Startup<H> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "Startup" )
			.field( "modules", &self.modules )
			.field( "extensions", &self.extensions )
			.finish()
	}
}

/// Drives the pipeline for a host context `H`.
pub struct ExtensionLoader<H: 'static> {
	config: LoaderConfig,
	host: Arc<H>,
	library: HostLibrary<H>,
	compiler: Compiler,
	loader: ModuleLoader<H>,
	contract: ExtensionContract,
}

impl<H: Send + Sync + 'static> ExtensionLoader<H> {

	/// Prepares a loader. Extensions will be constructed with `host` and may import
	/// the functions of `library`.
	///
	/// # Errors
	/// Fails if the engine can't be created or a host function can't be defined.
	pub fn new( config: LoaderConfig, host: Arc<H>, library: HostLibrary<H> ) -> Result<Self, StartupError> {

		let mut engine_config = wasmtime::Config::new();
		engine_config.consume_fuel( config.fuel.is_some() );
		let engine = Engine::new( &engine_config ).map_err( StartupError::Engine )?;

		let loader = ModuleLoader::new( engine, &library )?;
		Ok( Self {
			compiler: Compiler::new( config.compiler_options() ),
			contract: config.contract(),
			config,
			host,
			library,
			loader,
		})

	}

	#[inline] pub fn config( &self ) -> &LoaderConfig { &self.config }

	#[inline] pub fn host( &self ) -> &Arc<H> { &self.host }

	#[inline] pub fn engine( &self ) -> &Engine { self.loader.engine() }

	/// Runs the whole pipeline once.
	///
	/// # Errors
	/// Fails if the directory layout can't be prepared, or on the first extension
	/// that fails to construct or initialize. Nothing after that extension runs.
	pub fn startup( &self ) -> Result<Startup<H>, StartupError> {

		for dir in [ &self.config.references, &self.config.sources ] {
			std::fs::create_dir_all( dir ).map_err(| source | StartupError::Layout { path: dir.clone(), source })?;
		}

		let mut modules = Vec::new();
		let mut extensions = Vec::new();

		for path in self.module_dirs()? {

			let name = path.file_name()
				.map_or_else(|| path.display().to_string(), | name | name.to_string_lossy().into_owned() );

			let outcome = match self.load_module( &path ) {
				Ok( prepared ) => {
					prepared.warnings.iter().for_each(| warning | tracing::warn!( "{}", warning ));
					let initialized = initialize_all( prepared.extensions, &self.host, self.config.fuel )?;
					let names = initialized.iter().map(| extension | extension.manifest().name().to_string() ).collect();
					extensions.extend( initialized );
					ModuleOutcome::Initialized { extensions: names, warnings: prepared.warnings }
				},
				Err( err ) => {
					report( &name, &err );
					ModuleOutcome::Skipped( err )
				},
			};

			modules.push( ModuleReport { name, path, outcome });

		}

		Ok( Startup { modules, extensions })

	}

	/// Compiles, loads and searches one source directory.
	///
	/// # Errors
	/// Fails if the sources or references can't be read, the sources don't compile,
	/// or the image can't be loaded.
	pub fn load_module( &self, dir: &Path ) -> Result<PreparedModule<H>, ModuleError> {

		let unit = CompilationUnit::aggregate( dir )?;
		let references = resolve_references( &self.config.references, &self.config.reference_extension, &self.library )?;

		let image = self.compiler.compile( &unit, &references )
			.pipe(| result | match result {
				CompilationResult::Success( image ) => Ok( image ),
				CompilationResult::Failure( diagnostics ) => Err( ModuleError::Compile {
					module: unit.module_name().to_string(),
					diagnostics,
				}),
			})?;

		let module = self.loader.load( &image, &references )?;
		let extensions = order( discover( &module, &self.contract ));
		tracing::debug!( module = module.name(), extensions = extensions.len(), "Discovered extensions" );

		Ok( PreparedModule { module, warnings: image.warnings().to_vec(), extensions })

	}

	fn module_dirs( &self ) -> Result<Vec<PathBuf>, StartupError> {
		let layout_error = | source | StartupError::Layout { path: self.config.sources.clone(), source };
		let mut dirs = std::fs::read_dir( &self.config.sources )
			.map_err( layout_error )?
			.map(| entry | entry.map(| entry | entry.path() ))
			.collect::<Result<Vec<_>, _>>()
			.map_err( layout_error )?
			.into_iter()
			.filter(| path | path.is_dir() )
			.collect::<Vec<_>>();
		dirs.sort();
		Ok( dirs )
	}

}

fn report( name: &str, err: &ModuleError ) {
	match err {
		ModuleError::Compile { diagnostics, .. } => {
			for diagnostic in diagnostics.iter() { tracing::error!( "{}", diagnostic ); }
			tracing::error!( module = name, "{}", err );
		},
		_ => tracing::error!( module = name, "Skipping module: {}", err ),
	}
}

impl<H: 'static> std::fmt::Debug for ExtensionLoader<H> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ExtensionLoader" )
			.field( "config", &self.config )
			.field( "contract", &self.contract )
			.finish_non_exhaustive()
	}
}
