//! Parsers for Obsidian markdown syntax.

pub mod code_block;
pub mod frontmatter;
pub mod heading;
pub mod list_item;
pub mod tag;

pub use code_block::{find_code_block_ranges, CodeBlockRange};
pub use frontmatter::{extract_frontmatter, parse_frontmatter_with_path, split_frontmatter};
pub use heading::parse_headings;
pub use list_item::parse_list_items;
pub use tag::{normalize_tag, parse_tags, unique_tag_names};
