use tantivy::schema::{IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

use mapsearch_core::error::{Error, Result};

pub const TOKENIZER: &str = "mapsearch_text";

/// Reserved field names. Document fields never collide with them because
/// they are stored together under `__fields`.
pub const KEY: &str = "__key";
pub const ID: &str = "__id";
pub const CLASS: &str = "__class";
pub const LOCALE: &str = "__locale";
pub const CATEGORY: &str = "__category";
pub const TITLE: &str = "__title";
pub const DESCRIPTION: &str = "__description";
pub const URL: &str = "__url";
pub const IMAGE_URL: &str = "__image_url";
pub const FIELDS: &str = "__fields";
pub const ALL: &str = "__all";

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	for name in [KEY, ID, CLASS, LOCALE, CATEGORY] {
		schema_builder.add_text_field(name, STRING | STORED);
	}
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let stored_text = TextOptions::default().set_indexing_options(text_field_indexing.clone()).set_stored();
	schema_builder.add_text_field(TITLE, stored_text.clone());
	schema_builder.add_text_field(DESCRIPTION, stored_text);
	schema_builder.add_text_field(URL, STORED);
	schema_builder.add_text_field(IMAGE_URL, STORED);
	schema_builder.add_text_field(FIELDS, STORED);
	schema_builder.add_text_field(ALL, TextOptions::default().set_indexing_options(text_field_indexing));
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let stop_words = [
		"a","an","and","are","as","at","be","by","for","from","has","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","there","then","than","so","if",
	];
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(stop_words.into_iter().map(|s| s.to_string())))
		.build();
	index.tokenizers().register(TOKENIZER, tokenizer);
}

/// Resolved handles for the reserved fields.
#[derive(Debug, Clone, Copy)]
pub struct SchemaFields {
	pub key: tantivy::schema::Field,
	pub id: tantivy::schema::Field,
	pub class: tantivy::schema::Field,
	pub locale: tantivy::schema::Field,
	pub category: tantivy::schema::Field,
	pub title: tantivy::schema::Field,
	pub description: tantivy::schema::Field,
	pub url: tantivy::schema::Field,
	pub image_url: tantivy::schema::Field,
	pub fields: tantivy::schema::Field,
	pub all: tantivy::schema::Field,
}

impl SchemaFields {
	pub fn from_schema(schema: &Schema) -> Result<Self> {
		let field = |name: &str| schema.get_field(name).map_err(Error::adapter);
		Ok(Self {
			key: field(KEY)?,
			id: field(ID)?,
			class: field(CLASS)?,
			locale: field(LOCALE)?,
			category: field(CATEGORY)?,
			title: field(TITLE)?,
			description: field(DESCRIPTION)?,
			url: field(URL)?,
			image_url: field(IMAGE_URL)?,
			fields: field(FIELDS)?,
			all: field(ALL)?,
		})
	}
}
