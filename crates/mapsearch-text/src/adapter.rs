use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tantivy::collector::TopDocs;
use tantivy::query::{AllQuery, Query, QueryParser};
use tantivy::schema::Value;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use mapsearch_core::config::{resolve_with_base, Config};
use mapsearch_core::error::{Error, Result};
use mapsearch_core::localization::{is_derived_name, LocalizationStrategy, NoopStrategy};
use mapsearch_core::traits::Adapter;
use mapsearch_core::types::{Document, Field, QueryHit, SearchQuery};

use crate::tantivy_utils::{build_schema, register_tokenizer, SchemaFields};

const META_FILE: &str = "meta.json";
const MIN_WRITER_HEAP: usize = 15_000_000;
const DEFAULT_LIMIT: usize = 10;

/// `[tantivy]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TantivyConfig {
	pub index_dir: PathBuf,
	pub writer_heap_bytes: usize,
}

impl Default for TantivyConfig {
	fn default() -> Self {
		Self { index_dir: PathBuf::from("data/indexes"), writer_heap_bytes: 50_000_000 }
	}
}

impl TantivyConfig {
	/// Read `[tantivy]`, resolving a relative `index_dir` against `base`.
	pub fn from_config(config: &Config, base: &Path) -> Result<Self> {
		let mut settings: Self = config.get_or_default("tantivy")?;
		settings.index_dir = resolve_with_base(base, settings.index_dir.to_string_lossy());
		Ok(settings)
	}
}

struct OpenIndex {
	index: Index,
	fields: SchemaFields,
	reader: IndexReader,
	writer: Option<IndexWriter>,
	/// Uncommitted adds or deletes.
	dirty: bool,
}

impl OpenIndex {
	fn new(index: Index) -> Result<Self> {
		register_tokenizer(&index);
		let fields = SchemaFields::from_schema(&index.schema())?;
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(Error::adapter)?;
		Ok(Self { index, fields, reader, writer: None, dirty: false })
	}

	fn writer(&mut self, heap_bytes: usize) -> Result<&mut IndexWriter> {
		if self.writer.is_none() {
			let writer = self.index.writer_with_num_threads(1, heap_bytes.max(MIN_WRITER_HEAP)).map_err(Error::adapter)?;
			self.writer = Some(writer);
		}
		self.writer.as_mut().ok_or_else(|| Error::UnsupportedOperation("index writer unavailable".to_string()))
	}

	fn commit(&mut self) -> Result<()> {
		if !self.dirty {
			return Ok(());
		}
		if let Some(writer) = self.writer.as_mut() {
			writer.commit().map_err(Error::adapter)?;
			self.reader.reload().map_err(Error::adapter)?;
		}
		self.dirty = false;
		Ok(())
	}

	fn num_docs(&self) -> u64 {
		self.reader.searcher().num_docs()
	}
}

/// One Tantivy index per physical index name, under `root`.
///
/// Writes are staged in a per-index writer and become visible to `search`
/// after `flush` names the logical index. Opened indexes are kept for the
/// adapter's lifetime.
pub struct TantivyAdapter {
	root: PathBuf,
	heap_bytes: usize,
	localization: Arc<dyn LocalizationStrategy>,
	open: Mutex<HashMap<String, OpenIndex>>,
}

impl TantivyAdapter {
	pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
		Self::with_config(TantivyConfig { index_dir: root.into(), ..TantivyConfig::default() })
	}

	pub fn with_config(config: TantivyConfig) -> Result<Self> {
		std::fs::create_dir_all(&config.index_dir).map_err(Error::adapter)?;
		Ok(Self {
			root: config.index_dir,
			heap_bytes: config.writer_heap_bytes,
			localization: Arc::new(NoopStrategy),
			open: Mutex::new(HashMap::new()),
		})
	}

	pub fn with_localization(mut self, localization: Arc<dyn LocalizationStrategy>) -> Self {
		self.localization = localization;
		self
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn index_path(&self, name: &str) -> Result<PathBuf> {
		let valid = !name.is_empty()
			&& name != "."
			&& name != ".."
			&& !name.contains(|c: char| c == '/' || c == '\\');
		if !valid {
			return Err(Error::UnsupportedOperation(format!("\"{name}\" is not a valid index name")));
		}
		Ok(self.root.join(name))
	}

	/// Open `name`, creating it on disk when `create` is set. `None` when it
	/// does not exist and `create` is not set.
	fn with_index<R>(
		&self,
		name: &str,
		create: bool,
		f: impl FnOnce(&mut OpenIndex) -> Result<R>,
	) -> Result<Option<R>> {
		let mut open = self.open.lock();
		let entry = match open.entry(name.to_string()) {
			Entry::Occupied(entry) => entry.into_mut(),
			Entry::Vacant(slot) => {
				let path = self.index_path(name)?;
				let index = if path.join(META_FILE).exists() {
					tracing::debug!(index = %name, path = %path.display(), "opening tantivy index");
					Index::open_in_dir(&path).map_err(Error::adapter)?
				} else if create {
					tracing::debug!(index = %name, path = %path.display(), "creating tantivy index");
					std::fs::create_dir_all(&path).map_err(Error::adapter)?;
					Index::create_in_dir(&path, build_schema()).map_err(Error::adapter)?
				} else {
					return Ok(None);
				};
				slot.insert(OpenIndex::new(index)?)
			}
		};
		f(entry).map(Some)
	}

	/// Physical indexes on disk and in memory, sorted.
	fn physical_names(&self) -> Result<BTreeSet<String>> {
		let mut names: BTreeSet<String> = self.open.lock().keys().cloned().collect();
		for entry in walkdir::WalkDir::new(&self.root).min_depth(1).max_depth(1) {
			let entry = entry.map_err(Error::adapter)?;
			if entry.file_type().is_dir() && entry.path().join(META_FILE).exists() {
				names.insert(entry.file_name().to_string_lossy().into_owned());
			}
		}
		Ok(names)
	}

	fn to_tantivy(&self, fields: &SchemaFields, document: &Document) -> Result<TantivyDocument> {
		let mut doc = TantivyDocument::default();
		doc.add_text(fields.key, document_key(&document.class, &document.id));
		doc.add_text(fields.id, &document.id);
		doc.add_text(fields.class, &document.class);
		let promoted = [
			(fields.locale, &document.locale),
			(fields.category, &document.category),
			(fields.title, &document.title),
			(fields.description, &document.description),
			(fields.url, &document.url),
			(fields.image_url, &document.image_url),
		];
		for (field, value) in promoted {
			if let Some(value) = value {
				doc.add_text(field, value);
			}
		}
		doc.add_text(fields.fields, serde_json::to_string(&document.fields)?);
		for field in &document.fields {
			if !field.value.is_null() {
				doc.add_text(fields.all, field.value.to_string());
			}
		}
		Ok(doc)
	}
}

fn document_key(class: &str, id: &str) -> String {
	format!("{class}\u{1f}{id}")
}

fn from_tantivy(fields: &SchemaFields, doc: &TantivyDocument) -> Result<Document> {
	let text = |field| doc.get_first(field).and_then(|v| v.as_str()).map(str::to_string);
	let stored_fields: Vec<Field> = match text(fields.fields) {
		Some(json) => serde_json::from_str(&json)?,
		None => Vec::new(),
	};
	Ok(Document {
		id: text(fields.id).unwrap_or_default(),
		class: text(fields.class).unwrap_or_default(),
		locale: text(fields.locale),
		title: text(fields.title),
		url: text(fields.url),
		description: text(fields.description),
		image_url: text(fields.image_url),
		category: text(fields.category),
		fields: stored_fields,
	})
}

fn search_one(open: &OpenIndex, query_string: &str, limit: usize) -> Result<Vec<QueryHit>> {
	let searcher = open.reader.searcher();
	let query: Box<dyn Query> = if query_string.trim().is_empty() {
		Box::new(AllQuery)
	} else {
		let qp = QueryParser::for_index(&open.index, vec![open.fields.title, open.fields.description, open.fields.all]);
		let (query, errors) = qp.parse_query_lenient(query_string);
		if !errors.is_empty() {
			tracing::debug!(query = %query_string, errors = errors.len(), "lenient query parse");
		}
		query
	};
	let top_docs = searcher.search(&query, &TopDocs::with_limit(limit)).map_err(Error::adapter)?;
	let mut hits = Vec::with_capacity(top_docs.len());
	for (score, addr) in top_docs {
		let doc: TantivyDocument = searcher.doc(addr).map_err(Error::adapter)?;
		hits.push(QueryHit::new(from_tantivy(&open.fields, &doc)?, score));
	}
	Ok(hits)
}

impl Adapter for TantivyAdapter {
	fn name(&self) -> &str {
		"tantivy"
	}

	fn index(&self, document: &Document, index_name: &str) -> Result<()> {
		let heap = self.heap_bytes;
		self.with_index(index_name, true, |open| {
			let doc = self.to_tantivy(&open.fields, document)?;
			let key = Term::from_field_text(open.fields.key, &document_key(&document.class, &document.id));
			let writer = open.writer(heap)?;
			writer.delete_term(key);
			writer.add_document(doc).map_err(Error::adapter)?;
			open.dirty = true;
			Ok(())
		})?;
		Ok(())
	}

	fn deindex(&self, document: &Document, index_name: &str) -> Result<()> {
		let heap = self.heap_bytes;
		self.with_index(index_name, false, |open| {
			let key = Term::from_field_text(open.fields.key, &document_key(&document.class, &document.id));
			open.writer(heap)?.delete_term(key);
			open.dirty = true;
			Ok(())
		})?;
		Ok(())
	}

	fn purge(&self, index_name: &str) -> Result<()> {
		let variants: Vec<String> = self
			.physical_names()?
			.into_iter()
			.filter(|name| self.localization.is_variant_of(index_name, name))
			.collect();
		for name in variants {
			// dropping the handle releases the writer lock before the files go
			self.open.lock().remove(&name);
			let path = self.index_path(&name)?;
			if path.exists() {
				std::fs::remove_dir_all(&path).map_err(Error::adapter)?;
			}
			tracing::debug!(index = %name, "purged tantivy index");
			self.with_index(&name, true, |_| Ok(()))?;
		}
		Ok(())
	}

	fn search(&self, query: &SearchQuery) -> Result<Vec<QueryHit>> {
		let limit = query.limit().unwrap_or(DEFAULT_LIMIT);
		if limit == 0 {
			return Ok(Vec::new());
		}
		let mut hits = Vec::new();
		for name in query.index_names() {
			match self.with_index(name, false, |open| search_one(open, query.query_string(), limit))? {
				Some(found) => hits.extend(found),
				None => tracing::debug!(index = %name, "search skipped missing index"),
			}
		}
		hits.sort_by(|a, b| b.score.total_cmp(&a.score));
		hits.truncate(limit);
		Ok(hits)
	}

	fn status(&self) -> Result<BTreeMap<String, String>> {
		let names = self.physical_names()?;
		let mut status = BTreeMap::new();
		status.insert("index_dir".to_string(), self.root.display().to_string());
		status.insert("indexes".to_string(), names.len().to_string());
		for name in &names {
			if let Some(num_docs) = self.with_index(name, false, |open| Ok(open.num_docs()))? {
				status.insert(format!("idx:{name}.num_docs"), num_docs.to_string());
			}
		}
		Ok(status)
	}

	fn list_indexes(&self) -> Result<Vec<String>> {
		Ok(self.physical_names()?.into_iter().collect())
	}

	/// Commits every open index derived from one of `index_names`, including
	/// locales missing from the strategy's list.
	fn flush(&self, index_names: &[String]) -> Result<()> {
		let mut open = self.open.lock();
		for (name, index) in open.iter_mut() {
			if index_names.iter().any(|logical| is_derived_name(logical, name)) {
				if index.dirty {
					tracing::debug!(index = %name, "committing tantivy index");
				}
				index.commit()?;
			}
		}
		Ok(())
	}
}
