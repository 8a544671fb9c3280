mod config;
mod filler;
mod prompts;
mod translator;

pub use config::{init_default_config, ConfigOverrides, LocalizerConfig};
pub use filler::{
    discover_tables, fill_directory, fill_table, fill_table_file, FillOptions, FillSummary,
};
pub use prompts::{render_template, DEFAULT_TRANSLATE_TEXT};
pub use translator::Translator;
