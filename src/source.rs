//! Source aggregation.
//!
//! Every file below a source directory contributes to a single [`CompilationUnit`].
//! Files are not compiled in isolation: their contents are concatenated in a
//! depth-first walk (a directory's own files first, then each subdirectory), so a
//! syntax error anywhere only surfaces once the whole unit is compiled.

use std::ops::Range ;
use std::path::{ Path, PathBuf };
use itertools::Itertools ;
use pipe_trait::Pipe ;
use thiserror::Error ;

use crate::diagnostic::Location ;



/// Errors raised while reading a source tree.
#[derive( Debug, Error )]
pub enum SourceError {
	/// A directory couldn't be listed or a file couldn't be read.
	#[error( "Failed to read {}: {source}", .path.display() )]
	Io { path: PathBuf, source: std::io::Error },
	/// A source file isn't UTF-8 text.
	#[error( "{} is not valid UTF-8 text", .path.display() )]
	InvalidUtf8 { path: PathBuf },
}

/// The concatenated source text of one extension module.
///
/// Built once per source directory and consumed by the
/// [`Compiler`]( crate::Compiler ). The module name is the last path segment
/// of the directory the sources came from.
#[derive( Debug, Clone )]
pub struct CompilationUnit {
	module_name: String,
	text: String,
	source_map: SourceMap,
}

impl CompilationUnit {

	/// Reads every regular file below `directory` into a single unit.
	///
	/// An empty directory yields an empty unit, which compiles to a module
	/// declaring no types.
	///
	/// # Errors
	/// Fails if the tree can't be walked or a file can't be read as UTF-8 text.
	pub fn aggregate( directory: &Path ) -> Result<Self, SourceError> {
		let sources = collect_files( directory )?
			.into_iter()
			.map(| path | {
				let bytes = std::fs::read( &path )
					.map_err(| source | SourceError::Io { path: path.clone(), source })?;
				let text = String::from_utf8( bytes )
					.map_err(|_| SourceError::InvalidUtf8 { path: path.clone() })?;
				Ok(( path, text ))
			})
			.collect::<Result<Vec<_>, SourceError>>()?;
		Ok( Self::from_sources( module_name( directory ), sources ))
	}

	/// Builds a unit from in-memory sources, concatenated in the given order.
	pub fn from_sources(
		module_name: impl Into<String>,
		sources: impl IntoIterator<Item = ( PathBuf, String )>,
	) -> Self {
		let mut text = String::new();
		let mut spans = Vec::new();
		for ( path, content ) in sources {
			let start = text.len();
			text.push_str( &content );
			spans.push( SourceSpan { path, range: start..text.len() });
		}
		Self { module_name: module_name.into(), text, source_map: SourceMap { spans }}
	}

	/// Name of the module this unit compiles to.
	#[inline] pub fn module_name( &self ) -> &str { &self.module_name }

	/// The concatenated source text.
	#[inline] pub fn text( &self ) -> &str { &self.text }

	/// Where each original file ended up inside [`Self::text`].
	#[inline] pub fn source_map( &self ) -> &SourceMap { &self.source_map }

	/// Maps a byte offset inside [`Self::text`] back to the original file.
	pub fn locate( &self, offset: usize ) -> Location {
		self.source_map.locate( &self.text, offset ).unwrap_or( Location::Unknown )
	}

}

/// Byte ranges of the original files inside a [`CompilationUnit`]'s text.
#[derive( Debug, Clone, Default )]
pub struct SourceMap {
	spans: Vec<SourceSpan>,
}

#[derive( Debug, Clone )]
struct SourceSpan {
	path: PathBuf,
	range: Range<usize>,
}

impl SourceMap {

	/// Files that contributed to the unit, in concatenation order.
	pub fn files( &self ) -> impl Iterator<Item = &Path> {
		self.spans.iter().map(| span | span.path.as_path() )
	}

	/// Resolves `offset` to a 1-based line and column in the file that contains it.
	///
	/// An offset sitting exactly at the end of the text is attributed to the end of
	/// the last non-empty file.
	pub fn locate( &self, text: &str, offset: usize ) -> Option<Location> {

		let span = self.spans.iter()
			.find(| span | span.range.contains( &offset ))
			.or_else(|| self.spans.iter().rev().find(| span | !span.range.is_empty() && span.range.end == offset ))?;

		let preceding = text.get( span.range.start..offset )?;
		let line = preceding.matches( '\n' ).count() + 1 ;
		let column = preceding
			.rsplit( '\n' )
			.next()
			.map_or( 0, | tail | tail.chars().count() )
			+ 1 ;

		Some( Location::Source { file: span.path.clone(), line, column })

	}

}

fn module_name( directory: &Path ) -> String {
	directory.file_name()
		.map_or_else(|| "module".to_string(), | name | name.to_string_lossy().into_owned() )
}

fn collect_files( directory: &Path ) -> Result<Vec<PathBuf>, SourceError> {

	let io_error = | source | SourceError::Io { path: directory.to_path_buf(), source };

	let ( directories, files ): ( Vec<_>, Vec<_> ) = std::fs::read_dir( directory )
		.map_err( io_error )?
		.map(| entry | entry.map(| entry | entry.path() ))
		.collect::<Result<Vec<_>, _>>()
		.map_err( io_error )?
		.into_iter()
		.sorted()
		.partition(| path | path.is_dir() );

	let mut collected = files.into_iter()
		.filter(| path | path.is_file() )
		.collect::<Vec<_>>();
	for nested in directories {
		collect_files( &nested )?.pipe(| nested | collected.extend( nested ));
	}

	Ok( collected )

}
