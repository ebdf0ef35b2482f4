//! rifs-script: turns operations into standalone Python scripts.
//!
//! A materialized script imports the operation's class from its namespace,
//! rebuilds it from a literal keyword dictionary, and calls it. The farm runs
//! the script with the configured interpreter; nothing else is shipped.

pub mod literal;
pub mod materialize;
pub mod template;

pub use literal::{parse, parse_kwargs, render, render_kwargs};
pub use materialize::{
    materialize, read_script, render_script, script_file_name, ScriptInfo, SCRIPT_TEMPLATE,
};
pub use template::TemplateContext;
