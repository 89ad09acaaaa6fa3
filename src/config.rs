//! Loader settings.
//!
//! Every key is optional. A config file looks like:
//!
//! ```toml
//! references = "Reference"
//! sources = "SourceCodes"
//! reference-extension = "wasm"
//! warnings-as-errors = false
//! contract = "host:extension"
//! api-version = [2, 1]
//! fuel = 10000000
//! ```

use std::path::{ Path, PathBuf };
use serde::Deserialize ;
use thiserror::Error ;

use crate::compiler::CompilerOptions ;
use crate::discovery::ExtensionContract ;



#[derive( Debug, Error )]
pub enum ConfigError {
	#[error( "Failed to read {}: {source}", .path.display() )]
	Io { path: PathBuf, source: std::io::Error },
	#[error( "Failed to parse {}: {source}", .path.display() )]
	Parse { path: PathBuf, source: toml::de::Error },
}

/// Settings of an [`ExtensionLoader`]( crate::ExtensionLoader ).
#[derive( Clone, Debug, PartialEq, Eq, Deserialize )]
#[serde( default, rename_all = "kebab-case", deny_unknown_fields )]
pub struct LoaderConfig {
	/// Directory holding library references.
	pub references: PathBuf,
	/// Directory whose subdirectories are compiled, one module each.
	pub sources: PathBuf,
	/// File extension of library references.
	pub reference_extension: String,
	pub warnings_as_errors: bool,
	/// Contract name extension types must declare in `extends`.
	pub contract: String,
	/// Contract version offered to extensions, as `[major, minor]`.
	pub api_version: [u32; 2],
	/// Fuel budget for each constructor and initializer call; unbounded if unset.
	pub fuel: Option<u64>,
}

impl Default for LoaderConfig {
	fn default() -> Self {
		Self {
			references: PathBuf::from( "Reference" ),
			sources: PathBuf::from( "SourceCodes" ),
			reference_extension: "wasm".to_string(),
			warnings_as_errors: false,
			contract: ExtensionContract::DEFAULT_NAME.to_string(),
			api_version: [ ExtensionContract::DEFAULT_API_VERSION.major, ExtensionContract::DEFAULT_API_VERSION.minor ],
			fuel: None,
		}
	}
}

impl LoaderConfig {

	/// Reads a TOML config file.
	///
	/// # Errors
	/// Fails if the file can't be read or isn't a valid config.
	pub fn from_file( path: impl AsRef<Path> ) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let text = std::fs::read_to_string( path )
			.map_err(| source | ConfigError::Io { path: path.to_path_buf(), source })?;
		Self::from_toml( &text ).map_err(| source | ConfigError::Parse { path: path.to_path_buf(), source })
	}

	/// Parses a TOML config document.
	///
	/// # Errors
	/// Fails on invalid TOML, unknown keys or mistyped values.
	pub fn from_toml( text: &str ) -> Result<Self, toml::de::Error> {
		toml::from_str( text )
	}

	pub fn compiler_options( &self ) -> CompilerOptions {
		CompilerOptions { warnings_as_errors: self.warnings_as_errors }
	}

	pub fn contract( &self ) -> ExtensionContract {
		let [ major, minor ] = self.api_version ;
		ExtensionContract::new( self.contract.clone(), crate::ApiVersion::new( major, minor ))
	}

}
