//! A loader for extensions compiled from source at startup.
//!
//! The host keeps extension sources in a directory tree. At startup every
//! subdirectory of the sources root is compiled into one in-memory WebAssembly
//! module, the module is loaded into the running process, and the types it declares
//! are searched for ones implementing the host's extension contract. Those are
//! constructed with the host context and initialized, one at a time, in a
//! deterministic order.
//!
//! # Core Concepts
//!
//! - [`CompilationUnit`]: the concatenated text of every file below one source
//! 	directory, with a [`SourceMap`] pointing back into the original files.
//!
//! - [`Reference`]: something compiled code may import from. Every `*.wasm` library
//! 	in the references directory is one, and so is the host's own [`HostLibrary`].
//!
//! - [`Compiler`]: turns a unit into a [`BinaryImage`] or a non-empty list of
//! 	[`Diagnostic`]s.
//!
//! - [`LoadedModule`]: an image compiled into the engine together with the
//! 	[`ExtensionManifest`]s it declares.
//!
//! - [`ExtensionDescriptor`]: a declared type that passed [`discover`]y.
//!
//! - [`ExtensionInstance`]: a constructed extension living in its own store.
//!
//! # Writing an extension
//!
//! Sources are WAT module fields; the compiler wraps them into a module named after
//! the directory. A type declares itself with a JSON manifest in an `extension`
//! custom section and backs it with two exports, `T#new` and `T#initialize`:
//!
//! ```text
//! (import "host" "log" (func $log (param i32 i32)))
//! (memory (export "memory") 1)
//! (data (i32.const 0) "hello")
//! (func (export "demo.Greeter#new"))
//! (func (export "demo.Greeter#initialize") (call $log (i32.const 0) (i32.const 5)))
//! (@custom "extension" "{\"type\":\"demo.Greeter\",\"extends\":\"host:extension\",\"visibility\":\"public\",\"api-version\":[2,1],\"name\":\"Greeter\",\"version\":\"1.0\",\"order\":10}")
//! ```
//!
//! A type is discovered when it is `public`, not `abstract`, `extends` the contract
//! and carries an `api-version` the host supports. Discovered types are initialized
//! by ascending `order`, ties broken by name.
//!
//! # Failure policy
//!
//! A module that fails to compile or load is reported and skipped
//! ([`ModuleError`]). An extension whose constructor or initializer fails aborts the
//! whole startup ([`StartupError`]); nothing after it runs.
//!
//! # Example
//!
//! ```
//! use std::path::PathBuf ;
//! use wasm_ext_loader::{ CompilationUnit, CompilationResult, Compiler, CompilerOptions, HostLibrary };
//!
//! struct Host ;
//!
//! let library = HostLibrary::<Host>::new( "host" ).with_logging();
//! let references = vec![ library.reference() ];
//!
//! let unit = CompilationUnit::from_sources( "demo", [(
//! 	PathBuf::from( "demo/greeter.wat" ),
//! 	r#"(import "host" "log" (func (param i32 i32))) (func (export "demo.Greeter#new"))"#.to_string(),
//! )]);
//!
//! match Compiler::new( CompilerOptions::default() ).compile( &unit, &references ) {
//! 	CompilationResult::Success( image ) => assert!( image.warnings().is_empty() ),
//! 	CompilationResult::Failure( diagnostics ) => panic!( "{:?}", diagnostics ),
//! }
//! ```
//!
//! The whole pipeline is driven by an [`ExtensionLoader`]:
//!
//! ```no_run
//! use std::sync::Arc ;
//! use wasm_ext_loader::{ ExtensionLoader, HostLibrary, LoaderConfig };
//!
//! struct Host ;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let loader = ExtensionLoader::new(
//! 	LoaderConfig::default(),
//! 	Arc::new( Host ),
//! 	HostLibrary::new( "host" ).with_logging(),
//! )?;
//! let startup = loader.startup()?;
//! println!( "{} extensions running", startup.extensions().len() );
//! # Ok(())
//! # }
//! ```

mod diagnostic ;
mod source ;
mod reference ;
mod host ;
mod manifest ;
mod compiler ;
mod loader ;
mod discovery ;
mod ordering ;
mod extension ;
mod lifecycle ;
mod config ;
mod startup ;

#[doc( no_inline )]
pub use wasmtime::{ Engine, Val };
#[doc( no_inline )]
pub use nonempty_collections::NEVec ;

pub use diagnostic::{ Diagnostic, Severity, Location };
pub use diagnostic::{ SYNTAX_ERROR, VALIDATION_ERROR, UNRESOLVED_IMPORT, IMPORT_MISMATCH, MALFORMED_MANIFEST, DUPLICATE_TYPE, UNKNOWN_MANIFEST_KEY };
pub use source::{ CompilationUnit, SourceMap, SourceError };
pub use reference::{ Reference, ReferenceOrigin, ReferenceError, Symbol, Signature, ValueKind, resolve_references };
pub use host::{ ExtensionContext, HostLibrary, HostError };
pub use manifest::{ ExtensionManifest, ApiVersion, Visibility, ManifestError, EXTENSION_SECTION, read_manifests };
pub use compiler::{ Compiler, CompilerOptions, CompilationResult, BinaryImage };
pub use loader::{ ModuleLoader, LoadedModule, LoadError };
pub use discovery::{ ExtensionContract, Exclusion, classify, discover };
pub use ordering::{ order, compare };
pub use extension::{ ExtensionDescriptor, ExtensionInstance, ExtensionStatus, ConstructionError, InitializationError };
pub use lifecycle::initialize_all ;
pub use config::{ LoaderConfig, ConfigError };
pub use startup::{ ExtensionLoader, Startup, PreparedModule, ModuleReport, ModuleOutcome, ModuleError, StartupError };
